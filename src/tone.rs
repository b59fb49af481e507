// Tone pass
//
// Scores the emotional tone of a unit (the translation, or optionally its
// source) with keyword heuristics and, for strongly joyful, angry or
// surprised text, emphasises a few emotional words in the translation.
// Applied after translation; never required for correctness.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::config::ToneConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneLabel {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Neutral,
}

impl ToneLabel {
    /// Scoring order; also the tie-break order for the dominant tone
    pub const ALL: [ToneLabel; 7] = [
        ToneLabel::Joy,
        ToneLabel::Sadness,
        ToneLabel::Anger,
        ToneLabel::Fear,
        ToneLabel::Surprise,
        ToneLabel::Disgust,
        ToneLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneLabel::Joy => "joy",
            ToneLabel::Sadness => "sadness",
            ToneLabel::Anger => "anger",
            ToneLabel::Fear => "fear",
            ToneLabel::Surprise => "surprise",
            ToneLabel::Disgust => "disgust",
            ToneLabel::Neutral => "neutral",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            ToneLabel::Joy => &[
                "happy", "joyful", "excited", "delighted", "cheerful", "glad", "pleased", "content",
                "blissful", "elated", "laugh", "smile", "wonderful", "amazing", "fantastic",
            ],
            ToneLabel::Sadness => &[
                "sad", "depressed", "melancholy", "sorrowful", "gloomy", "dejected", "downhearted",
                "mournful", "cry", "weep", "tears", "grief", "lonely", "despair",
            ],
            ToneLabel::Anger => &[
                "angry", "furious", "enraged", "livid", "irate", "mad", "irritated", "annoyed",
                "frustrated", "hostile", "rage", "wrath", "hate", "damn", "hell",
            ],
            ToneLabel::Fear => &[
                "afraid", "scared", "frightened", "terrified", "anxious", "worried", "nervous",
                "panic", "dread", "horror", "alarmed", "apprehensive", "uneasy",
            ],
            ToneLabel::Surprise => &[
                "surprised", "shocked", "amazed", "astonished", "stunned", "bewildered", "startled",
                "unexpected", "sudden", "wow", "incredible", "unbelievable",
            ],
            ToneLabel::Disgust => &[
                "disgusted", "revolted", "repulsed", "nauseated", "sickened", "appalled",
                "horrified", "gross", "yuck", "eww", "horrible", "awful",
            ],
            ToneLabel::Neutral => &[
                "said", "went", "came", "looked", "walked", "moved", "turned", "opened", "closed",
                "took", "gave", "found", "saw", "heard",
            ],
        }
    }

    /// Words uppercased when this tone dominates strongly; empty for
    /// tones that never get emphasis
    fn emphasis_words(&self) -> &'static [&'static str] {
        match self {
            ToneLabel::Joy => &["wonderful", "amazing", "fantastic", "incredible", "brilliant"],
            ToneLabel::Anger => &["terrible", "awful", "horrible", "disgusting", "outrageous"],
            ToneLabel::Surprise => &["incredible", "unbelievable", "amazing", "shocking"],
            _ => &[],
        }
    }
}

impl fmt::Display for ToneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label weights in scoring order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToneScores(Vec<(ToneLabel, f64)>);

impl ToneScores {
    pub fn new(scores: Vec<(ToneLabel, f64)>) -> Self {
        Self(scores)
    }

    pub fn neutral() -> Self {
        Self(vec![(ToneLabel::Neutral, 1.0)])
    }

    pub fn get(&self, label: ToneLabel) -> f64 {
        self.0
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0.0, |(_, weight)| *weight)
    }

    /// Highest-weighted label; the earliest one wins ties
    pub fn dominant(&self) -> Option<(ToneLabel, f64)> {
        let mut best: Option<(ToneLabel, f64)> = None;
        for &(label, weight) in &self.0 {
            if best.is_none_or(|(_, w)| weight > w) {
                best = Some((label, weight));
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ToneLabel, f64)> {
        self.0.iter()
    }
}

/// Scores text into tone weights
pub trait ToneScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<ToneScores>;
}

/// Keyword-count heuristic scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordToneScorer;

impl ToneScorer for KeywordToneScorer {
    fn score(&self, text: &str) -> Result<ToneScores> {
        if text.trim().is_empty() {
            return Ok(ToneScores::neutral());
        }

        let text_lower = text.to_lowercase();
        let counts: Vec<(ToneLabel, usize)> = ToneLabel::ALL
            .iter()
            .map(|label| {
                let count = label
                    .keywords()
                    .iter()
                    .map(|keyword| text_lower.matches(keyword).count())
                    .sum();
                (*label, count)
            })
            .collect();

        let total: usize = counts.iter().map(|(_, count)| count).sum();
        if total == 0 {
            return Ok(ToneScores::neutral());
        }

        let scores = ToneScores::new(
            counts
                .into_iter()
                .map(|(label, count)| (label, count as f64 / total as f64))
                .collect(),
        );
        debug!("Tone analysis result: {:?}", scores);
        Ok(scores)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToneSummary {
    pub dominant: ToneLabel,
    pub confidence: f64,
    /// Labels weighing more than 0.1, rounded to three places
    pub significant: Vec<(ToneLabel, f64)>,
    pub total_significant: usize,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub struct ToneProcessor {
    scorer: Box<dyn ToneScorer>,
    min_intensity: f64,
    emphasis_intensity: f64,
}

impl ToneProcessor {
    pub fn new(config: &ToneConfig) -> Self {
        Self::with_scorer(Box::new(KeywordToneScorer), config)
    }

    pub fn with_scorer(scorer: Box<dyn ToneScorer>, config: &ToneConfig) -> Self {
        Self {
            scorer,
            min_intensity: config.min_intensity,
            emphasis_intensity: config.emphasis_intensity,
        }
    }

    /// Score `text` and apply tone markers to it
    pub fn enhance(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let scores = self.scorer.score(text)?;
        let enhanced = self.apply_markers(text, &scores);

        if let Some((label, _)) = scores.dominant() {
            debug!("Applied tone pass, dominant tone: {}", label);
        }
        Ok(enhanced)
    }

    /// Apply markers derived from the source text's tone to its translation.
    /// Scoring failures leave the translation as is.
    pub fn preserve_from(&self, original: &str, translated: &str) -> String {
        match self.scorer.score(original) {
            Ok(scores) => self.apply_markers(translated, &scores),
            Err(e) => {
                warn!("Error preserving tone from source text: {}", e);
                translated.to_string()
            }
        }
    }

    pub fn summary(&self, text: &str) -> Result<ToneSummary> {
        let scores = self.scorer.score(text)?;
        let (dominant, confidence) = scores.dominant().unwrap_or((ToneLabel::Neutral, 0.0));

        let significant: Vec<(ToneLabel, f64)> = scores
            .iter()
            .filter(|(_, weight)| *weight > 0.1)
            .map(|&(label, weight)| (label, round3(weight)))
            .collect();

        Ok(ToneSummary {
            dominant,
            confidence: round3(confidence),
            total_significant: significant.len(),
            significant,
        })
    }

    fn apply_markers(&self, text: &str, scores: &ToneScores) -> String {
        let Some((label, intensity)) = scores.dominant() else {
            return text.to_string();
        };

        if intensity < self.min_intensity {
            return text.to_string();
        }

        let words = label.emphasis_words();
        if words.is_empty() || intensity <= self.emphasis_intensity {
            return text.to_string();
        }

        words
            .iter()
            .fold(text.to_string(), |acc, word| acc.replace(word, &word.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::HonyakuError;

    struct BrokenScorer;

    impl ToneScorer for BrokenScorer {
        fn score(&self, _text: &str) -> Result<ToneScores> {
            Err(HonyakuError::Tone("scorer offline".to_string()))
        }
    }

    fn processor() -> ToneProcessor {
        ToneProcessor::new(&Config::default().tone)
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let scores = KeywordToneScorer.score("   ").unwrap();
        assert_eq!(scores, ToneScores::neutral());
        assert_eq!(processor().enhance("").unwrap(), "");
    }

    #[test]
    fn test_no_keywords_is_neutral() {
        let scores = KeywordToneScorer.score("Zebra xylophone").unwrap();
        assert_eq!(scores.dominant(), Some((ToneLabel::Neutral, 1.0)));
    }

    #[test]
    fn test_scores_are_normalized() {
        let scores = KeywordToneScorer.score("happy sad").unwrap();
        assert!((scores.get(ToneLabel::Joy) - 0.5).abs() < 1e-9);
        assert!((scores.get(ToneLabel::Sadness) - 0.5).abs() < 1e-9);
        let total: f64 = scores.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // Equal weights: the first label in scoring order wins
        assert_eq!(scores.dominant().map(|(l, _)| l), Some(ToneLabel::Joy));
    }

    #[test]
    fn test_strong_joy_emphasises_words() {
        let text = "What a wonderful, amazing day. I laugh and smile.";
        assert_eq!(
            processor().enhance(text).unwrap(),
            "What a WONDERFUL, AMAZING day. I laugh and smile."
        );
    }

    #[test]
    fn test_weak_tone_leaves_text_alone() {
        let text = "wonderful sad angry afraid";
        assert_eq!(processor().enhance(text).unwrap(), text);
    }

    #[test]
    fn test_non_emphatic_tone_leaves_text_alone() {
        let text = "He walked home.";
        assert_eq!(processor().enhance(text).unwrap(), text);
    }

    #[test]
    fn test_preserve_from_uses_source_tone() {
        let translated = processor().preserve_from(
            "I am so angry, furious with rage!",
            "That was terrible and outrageous",
        );
        assert_eq!(translated, "That was TERRIBLE and OUTRAGEOUS");
    }

    #[test]
    fn test_scorer_failure() {
        let tone = ToneProcessor::with_scorer(Box::new(BrokenScorer), &Config::default().tone);
        assert!(tone.enhance("wonderful").is_err());
        assert_eq!(tone.preserve_from("wonderful", "merveilleux"), "merveilleux");
    }

    #[test]
    fn test_summary() {
        let summary = processor().summary("happy happy sad").unwrap();
        assert_eq!(summary.dominant, ToneLabel::Joy);
        assert!((summary.confidence - 0.667).abs() < 1e-9);
        assert_eq!(summary.total_significant, 2);
        assert_eq!(summary.significant[1], (ToneLabel::Sadness, 0.333));
    }
}
