// Best-effort language identification
//
// A statistical detector (whatlang) is consulted first when enabled. Whenever it
// cannot decide, detection falls back to marker-word scoring and finally to
// Unicode script sniffing. Detection never fails from the caller's point of view.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use whatlang::{Detector, Lang};

use crate::config::DetectConfig;
use crate::error::{HonyakuError, Result};

/// Code returned for empty input and when nothing else matches
pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages the translation backends can handle
pub const SUPPORTED_LANGUAGES: [&str; 10] = ["en", "es", "fr", "de", "it", "pt", "ja", "ko", "zh", "ru"];

/// Regional variants folded onto one canonical code
const LANGUAGE_ALIASES: &[(&str, &str)] = &[("zh-cn", "zh"), ("zh-tw", "zh")];

/// Marker lists scored by the heuristic fallback.
///
/// Order matters: when two languages tie on score the one listed first wins.
const LANGUAGE_MARKERS: &[(&str, &[&str])] = &[
    ("es", &[
        "el ", "la ", "de ", "que ", "y ", "a ", "en ", "un ", "es ", "se ", "no ", "te ", "lo ",
        "le ", "da ", "su ", "por ", "son ", "con ", "para ", "una ", "son ", "del ", "al ", "qué ",
        "más",
    ]),
    ("fr", &[
        "le ", "de ", "et ", "à ", "un ", "il ", "être ", "et ", "en ", "avoir ", "que ", "pour ",
        "dans ", "ce ", "son ", "une ", "sur ", "avec ", "ne ", "se ", "pas ", "tout ", "plus ",
        "par ", "grand", "où", "ou", "qui",
    ]),
    ("de", &[
        "der ", "die ", "und ", "in ", "den ", "von ", "zu ", "das ", "mit ", "sich ", "des ",
        "auf ", "für ", "ist ", "im ", "dem ", "nicht ", "ein ", "eine ", "als ", "auch ", "es ",
        "an ", "werden", "aus", "er", "hat", "dass",
    ]),
    ("it", &[
        "il ", "di ", "che ", "e ", "la ", "per ", "un ", "in ", "con ", "del ", "da ", "a ", "al ",
        "sono ", "le ", "si ", "gli ", "una", "dei", "nel", "alla", "come", "più", "anche",
        "tutto", "già",
    ]),
    ("pt", &[
        "de ", "a ", "o ", "que ", "e ", "do ", "da ", "em ", "um ", "para ", "é ", "com ", "não ",
        "uma ", "os ", "no ", "se ", "na ", "por ", "mais", "das", "dos", "como", "mas", "foi",
        "ao", "ele",
    ]),
    ("ja", &[
        "の", "に", "は", "を", "た", "が", "で", "て", "と", "し", "れ", "さ", "ある", "いる", "も",
        "する", "から", "な", "こと", "として", "い", "や", "れる", "など", "なっ", "また", "その",
        "これ",
    ]),
    ("ko", &[
        "이", "의", "가", "을", "는", "에", "과", "로", "으로", "에서", "와", "한", "하", "되", "있",
        "들", "것", "수", "등", "같", "후", "전", "다시", "또", "통해", "위해", "대한", "따른",
    ]),
    ("zh", &[
        "的", "一", "是", "在", "不", "了", "有", "和", "人", "这", "中", "大", "为", "上", "个",
        "国", "我", "以", "要", "他", "时", "来", "用", "们", "生", "到", "作", "地", "于", "出",
        "就",
    ]),
    ("ru", &[
        "и ", "в ", "не ", "на ", "я ", "быть ", "он ", "с ", "что ", "а ", "по ", "это ", "она ",
        "этот ", "к ", "но ", "они ", "мы ", "как ", "из ", "у ", "который ", "то ", "за ",
        "свой ", "что ", "же",
    ]),
];

/// Script ranges checked in priority order once marker scoring finds nothing
const SCRIPT_RANGES: &[(u32, u32, &str, &str)] = &[
    (0x4E00, 0x9FFF, "zh", "CJK ideographs"),
    (0x3040, 0x309F, "ja", "Hiragana"),
    (0x30A0, 0x30FF, "ja", "Katakana"),
    (0xAC00, 0xD7AF, "ko", "Hangul"),
    (0x0400, 0x04FF, "ru", "Cyrillic"),
];

/// A detector that may refuse to decide
pub trait StatisticalDetector: Send + Sync {
    /// Identify the language of `text`, or report that no decision is possible
    fn detect(&self, text: &str) -> Result<String>;
}

/// Trigram-based detection backed by the whatlang crate
pub struct WhatlangDetector {
    detector: Detector,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self {
            detector: Detector::new(),
        }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticalDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String> {
        let info = self
            .detector
            .detect(text)
            .ok_or_else(|| HonyakuError::Detection("no language features found".to_string()))?;

        if !info.is_reliable() {
            return Err(HonyakuError::Detection(format!(
                "unreliable guess {:?} (confidence {:.2})",
                info.lang(),
                info.confidence()
            )));
        }

        let code = match info.lang() {
            Lang::Eng => "en",
            Lang::Spa => "es",
            Lang::Fra => "fr",
            Lang::Deu => "de",
            Lang::Ita => "it",
            Lang::Por => "pt",
            Lang::Jpn => "ja",
            Lang::Kor => "ko",
            Lang::Cmn => "zh",
            Lang::Rus => "ru",
            Lang::Ara => "ar",
            Lang::Hin => "hi",
            Lang::Nld => "nl",
            Lang::Tur => "tr",
            Lang::Pol => "pl",
            Lang::Swe => "sv",
            Lang::Vie => "vi",
            Lang::Ukr => "uk",
            // Anything else keeps whatlang's three-letter code
            other => other.code(),
        };
        Ok(code.to_string())
    }
}

/// Language detector with a deterministic fallback chain
pub struct LanguageDetector {
    statistical: Option<Box<dyn StatisticalDetector>>,
    sample_chars: usize,
}

impl LanguageDetector {
    /// Build the detector described by the configuration
    pub fn new(config: &DetectConfig) -> Self {
        let statistical: Option<Box<dyn StatisticalDetector>> = if config.use_statistical {
            Some(Box::new(WhatlangDetector::new()))
        } else {
            None
        };
        Self {
            statistical,
            sample_chars: config.sample_chars,
        }
    }

    /// Detector that only ever uses the heuristic fallback
    pub fn heuristic_only() -> Self {
        Self {
            statistical: None,
            sample_chars: 1000,
        }
    }

    /// Detector backed by a caller-supplied statistical detector
    pub fn with_statistical(detector: Box<dyn StatisticalDetector>) -> Self {
        Self {
            statistical: Some(detector),
            sample_chars: 1000,
        }
    }

    /// Detect the language of `text`.
    ///
    /// Empty or whitespace-only text yields [`DEFAULT_LANGUAGE`]. Only the first
    /// `sample_chars` characters of the trimmed text are analysed.
    pub fn detect(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            warn!("Empty text provided for language detection");
            return DEFAULT_LANGUAGE.to_string();
        }

        let sample: String = trimmed.chars().take(self.sample_chars).collect();

        let Some(statistical) = &self.statistical else {
            return fallback_language_detection(&sample);
        };

        match statistical.detect(&sample) {
            Ok(code) => {
                let code = normalize_language_code(&code);
                info!("Detected language: {}", code);
                code
            }
            Err(e) => {
                warn!("Language detection failed: {}", e);
                fallback_language_detection(&sample)
            }
        }
    }
}

/// Fold known aliases onto their canonical code
pub fn normalize_language_code(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lower)
}

/// Heuristic detection by marker scoring, then script sniffing, then the default
pub fn fallback_language_detection(text: &str) -> String {
    if text.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }

    let text_lower = text.to_lowercase();

    let mut best: Option<(&str, usize)> = None;
    for (lang, markers) in LANGUAGE_MARKERS {
        let score: usize = markers
            .iter()
            .map(|marker| text_lower.matches(marker).count())
            .sum();
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((lang, score));
        }
    }

    if let Some((lang, score)) = best {
        if score > 0 {
            info!("Fallback detection result: {} (score: {})", lang, score);
            return normalize_language_code(lang);
        }
    }

    for (start, end, lang, script) in SCRIPT_RANGES {
        if text.chars().any(|c| (*start..=*end).contains(&(c as u32))) {
            info!("Detected {} characters", script);
            return lang.to_string();
        }
    }

    debug!("No language patterns matched, defaulting to {}", DEFAULT_LANGUAGE);
    DEFAULT_LANGUAGE.to_string()
}

/// Human-readable name for a language code
pub fn get_language_name(code: &str) -> String {
    let name = match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "nl" => "Dutch",
        "sv" => "Swedish",
        "da" => "Danish",
        "no" => "Norwegian",
        "fi" => "Finnish",
        "pl" => "Polish",
        "tr" => "Turkish",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "ms" => "Malay",
        "tl" => "Filipino",
        "he" => "Hebrew",
        "fa" => "Persian",
        "ur" => "Urdu",
        "bn" => "Bengali",
        "ta" => "Tamil",
        "te" => "Telugu",
        "ml" => "Malayalam",
        "kn" => "Kannada",
        "gu" => "Gujarati",
        "mr" => "Marathi",
        "ne" => "Nepali",
        "si" => "Sinhala",
        "my" => "Myanmar",
        "km" => "Khmer",
        "lo" => "Lao",
        "ka" => "Georgian",
        "am" => "Amharic",
        "sw" => "Swahili",
        "zu" => "Zulu",
        "af" => "Afrikaans",
        "sq" => "Albanian",
        "az" => "Azerbaijani",
        "be" => "Belarusian",
        "bg" => "Bulgarian",
        "ca" => "Catalan",
        "hr" => "Croatian",
        "cs" => "Czech",
        "et" => "Estonian",
        "eu" => "Basque",
        "gl" => "Galician",
        "hu" => "Hungarian",
        "is" => "Icelandic",
        "ga" => "Irish",
        "lv" => "Latvian",
        "lt" => "Lithuanian",
        "mk" => "Macedonian",
        "mt" => "Maltese",
        "ro" => "Romanian",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "uk" => "Ukrainian",
        "cy" => "Welsh",
        _ => return format!("Unknown ({})", code),
    };
    name.to_string()
}

/// Whether a backend can translate into or out of `code`
pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// Supported codes mapped to their names
pub fn get_supported_languages() -> BTreeMap<String, String> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|code| (code.to_string(), get_language_name(code)))
        .collect()
}
