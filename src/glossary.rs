// Translation glossary
//
// Maps an exact (trimmed) source term to its committed translation, a usage
// counter and a short context history. Used as a consistency cache: chunks and
// proper nouns translated once are reused verbatim afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::config::GlossaryConfig;
use crate::error::{HonyakuError, Result};

/// Tunables for context retention and similar-term search
#[derive(Debug, Clone, Copy)]
pub struct GlossaryOptions {
    /// Most recent context strings kept per term
    pub context_history_limit: usize,
    /// Required character-set overlap, relative to the shorter term
    pub similarity_threshold: f64,
}

impl Default for GlossaryOptions {
    fn default() -> Self {
        Self {
            context_history_limit: 5,
            similarity_threshold: 0.7,
        }
    }
}

impl From<&GlossaryConfig> for GlossaryOptions {
    fn from(config: &GlossaryConfig) -> Self {
        Self {
            context_history_limit: config.context_history_limit,
            similarity_threshold: config.similarity_threshold,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// Committed translation; empty means "known but not yet translated"
    pub translation: String,
    pub usage_count: u64,
    /// Oldest first
    pub context_history: Vec<String>,
}

/// On-disk layout: three parallel maps keyed by source term
#[derive(Debug, Default, Serialize, Deserialize)]
struct GlossarySnapshot {
    #[serde(default)]
    terms: BTreeMap<String, String>,
    #[serde(default)]
    usage_count: BTreeMap<String, u64>,
    #[serde(default)]
    context: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryStatistics {
    pub total_terms: usize,
    pub total_usage: u64,
    pub avg_usage: f64,
    pub most_used_term: Option<String>,
    pub most_used_count: u64,
    pub terms_with_context: usize,
}

/// Consistency cache from source terms to translations.
///
/// Terms are kept in key order, which is also the order used to break ties
/// in [`Glossary::get_statistics`] and [`Glossary::find_similar_terms`].
#[derive(Debug, Clone, Default)]
pub struct Glossary {
    entries: BTreeMap<String, GlossaryEntry>,
    options: GlossaryOptions,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GlossaryOptions) -> Self {
        Self {
            entries: BTreeMap::new(),
            options,
        }
    }

    /// Load a glossary snapshot into a fresh instance
    pub fn from_file<P: AsRef<Path>>(path: P, options: GlossaryOptions) -> Result<Self> {
        let mut glossary = Self::with_options(options);
        glossary.load(path)?;
        Ok(glossary)
    }

    /// Record a translation for `original`.
    ///
    /// The stored translation is always overwritten and the usage count always
    /// grows by one. A non-empty `context` is appended unless it repeats the most
    /// recent entry.
    pub fn add_term(&mut self, original: &str, translated: &str, context: Option<&str>) {
        let original = original.trim();
        if original.is_empty() {
            return;
        }
        let translated = translated.trim();
        let limit = self.options.context_history_limit;

        let entry = self.entries.entry(original.to_string()).or_default();

        if !translated.is_empty() && !entry.translation.is_empty() && entry.translation != translated {
            info!(
                "Updating translation for '{}': '{}' -> '{}'",
                original, entry.translation, translated
            );
        }

        entry.translation = translated.to_string();
        entry.usage_count += 1;

        if let Some(context) = context.filter(|c| !c.is_empty()) {
            if entry.context_history.last().map(String::as_str) != Some(context) {
                entry.context_history.push(context.to_string());
                if entry.context_history.len() > limit {
                    let excess = entry.context_history.len() - limit;
                    entry.context_history.drain(..excess);
                }
            }
        }

        debug!("Added term to glossary: '{}' -> '{}'", original, translated);
    }

    /// Usable translation for `original`; `None` when absent or still empty
    pub fn get_translation(&self, original: &str) -> Option<&str> {
        let original = original.trim();
        if original.is_empty() {
            return None;
        }

        self.entries
            .get(original)
            .map(|entry| entry.translation.as_str())
            .filter(|translation| !translation.trim().is_empty())
    }

    pub fn has_term(&self, original: &str) -> bool {
        self.entries.contains_key(original.trim())
    }

    /// Remove a term together with its usage count and context
    pub fn remove_term(&mut self, original: &str) -> bool {
        let original = original.trim();
        if original.is_empty() {
            return false;
        }

        let removed = self.entries.remove(original).is_some();
        if removed {
            info!("Removed term from glossary: '{}'", original);
        }
        removed
    }

    pub fn get_usage_count(&self, original: &str) -> u64 {
        self.entries
            .get(original.trim())
            .map_or(0, |entry| entry.usage_count)
    }

    pub fn get_context(&self, original: &str) -> &[String] {
        self.entries
            .get(original.trim())
            .map_or(&[], |entry| entry.context_history.as_slice())
    }

    pub fn get_entry(&self, original: &str) -> Option<&GlossaryEntry> {
        self.entries.get(original.trim())
    }

    /// All terms and their (possibly empty) translations
    pub fn get_all_terms(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(term, entry)| (term.clone(), entry.translation.clone()))
            .collect()
    }

    /// Terms used at least `min_usage` times
    pub fn get_frequent_terms(&self, min_usage: u64) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.usage_count >= min_usage)
            .map(|(term, entry)| (term.clone(), entry.translation.clone()))
            .collect()
    }

    /// Merge `other` into this glossary.
    ///
    /// New terms arrive with the other glossary's usage count. For shared terms
    /// the local translation survives when `prefer_existing` is set and it is
    /// non-empty; either way the other usage count is added to the local one.
    pub fn merge(&mut self, other: &Glossary, prefer_existing: bool) {
        for (term, other_entry) in &other.entries {
            match self.entries.get(term).map(|entry| entry.translation.is_empty()) {
                Some(local_is_empty) => {
                    if !prefer_existing || local_is_empty {
                        self.add_term(term, &other_entry.translation, None);
                    }
                    if let Some(entry) = self.entries.get_mut(term) {
                        entry.usage_count += other_entry.usage_count;
                    }
                }
                None => {
                    self.add_term(term, &other_entry.translation, None);
                    if let Some(entry) = self.entries.get_mut(term) {
                        entry.usage_count = other_entry.usage_count;
                        entry.context_history = other_entry.context_history.clone();
                    }
                }
            }
        }

        info!("Merged glossary with {} terms", other.len());
    }

    pub fn clear(&mut self) {
        let term_count = self.entries.len();
        self.entries.clear();
        info!("Cleared glossary ({} terms removed)", term_count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the glossary as a single JSON document
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let mut snapshot = GlossarySnapshot::default();
        for (term, entry) in &self.entries {
            snapshot.terms.insert(term.clone(), entry.translation.clone());
            snapshot.usage_count.insert(term.clone(), entry.usage_count);
            snapshot.context.insert(term.clone(), entry.context_history.clone());
        }

        let content = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write next to the target, then swap it in
        let staging = path.with_extension("json.partial");
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, path)?;

        info!("Saved glossary to {}", path.display());
        Ok(())
    }

    /// Replace the in-memory state with a saved snapshot.
    ///
    /// On any error the current state is left untouched.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HonyakuError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let mut snapshot: GlossarySnapshot = serde_json::from_str(&content)
            .map_err(|e| HonyakuError::Glossary(format!("Invalid glossary file {}: {}", path.display(), e)))?;

        let entries: BTreeMap<String, GlossaryEntry> = std::mem::take(&mut snapshot.terms)
            .into_iter()
            .map(|(term, translation)| {
                let entry = GlossaryEntry {
                    translation,
                    usage_count: snapshot.usage_count.get(&term).copied().unwrap_or(0),
                    context_history: snapshot.context.remove(&term).unwrap_or_default(),
                };
                (term, entry)
            })
            .collect();

        self.entries = entries;
        info!("Loaded glossary from {} ({} terms)", path.display(), self.entries.len());
        Ok(())
    }

    /// Approximate lookup of related terms, most used first.
    ///
    /// A stored term matches when it contains or is contained in `term`
    /// (case-insensitively), or when the two share enough distinct characters.
    /// An exact case-insensitive match is never returned.
    pub fn find_similar_terms(&self, term: &str, max_results: usize) -> Vec<String> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }

        let term_chars: HashSet<char> = term.chars().collect();
        let term_len = term.chars().count();

        let mut similar: Vec<&String> = self
            .entries
            .keys()
            .filter(|original| {
                let original_lower = original.to_lowercase();
                if original_lower == term {
                    return false;
                }
                if original_lower.contains(&term) || term.contains(&original_lower) {
                    return true;
                }
                let original_chars: HashSet<char> = original_lower.chars().collect();
                let shared = term_chars.intersection(&original_chars).count();
                let shorter = term_len.min(original_lower.chars().count());
                shared as f64 >= shorter as f64 * self.options.similarity_threshold
            })
            .collect();

        similar.sort_by(|a, b| self.get_usage_count(b).cmp(&self.get_usage_count(a)));

        similar
            .into_iter()
            .take(max_results)
            .cloned()
            .collect()
    }

    pub fn get_statistics(&self) -> GlossaryStatistics {
        let total_terms = self.entries.len();
        let total_usage: u64 = self.entries.values().map(|entry| entry.usage_count).sum();
        let avg_usage = if total_terms > 0 {
            (total_usage as f64 / total_terms as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        let mut most_used: Option<(&String, u64)> = None;
        for (term, entry) in &self.entries {
            if most_used.is_none_or(|(_, count)| entry.usage_count > count) {
                most_used = Some((term, entry.usage_count));
            }
        }

        GlossaryStatistics {
            total_terms,
            total_usage,
            avg_usage,
            most_used_term: most_used.map(|(term, _)| term.clone()),
            most_used_count: most_used.map_or(0, |(_, count)| count),
            terms_with_context: self
                .entries
                .values()
                .filter(|entry| !entry.context_history.is_empty())
                .count(),
        }
    }
}

impl fmt::Display for Glossary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.get_statistics();
        write!(f, "Glossary({} terms, avg_usage: {})", stats.total_terms, stats.avg_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_term_trims_and_ignores_blank_keys() {
        let mut glossary = Glossary::new();
        glossary.add_term("  dragon  ", "  dragón ", None);
        glossary.add_term("   ", "nothing", None);

        assert_eq!(glossary.len(), 1);
        assert_eq!(glossary.get_translation("dragon"), Some("dragón"));
    }

    #[test]
    fn test_repeated_add_counts_every_call() {
        let mut glossary = Glossary::new();
        glossary.add_term("castle", "castillo", None);
        glossary.add_term("castle", "castillo", None);

        assert_eq!(glossary.get_translation("castle"), Some("castillo"));
        assert_eq!(glossary.get_usage_count("castle"), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut glossary = Glossary::new();
        glossary.add_term("castle", "castillo", None);
        glossary.add_term("castle", "fortaleza", None);
        assert_eq!(glossary.get_translation("castle"), Some("fortaleza"));
    }

    #[test]
    fn test_empty_translation_is_known_but_not_found() {
        let mut glossary = Glossary::new();
        glossary.add_term("Aria", "", None);

        assert!(glossary.has_term("Aria"));
        assert_eq!(glossary.get_translation("Aria"), None);
        assert_eq!(glossary.get_translation("Missing"), None);
    }

    #[test]
    fn test_context_history_dedup_and_eviction() {
        let mut glossary = Glossary::new();
        for ctx in ["a", "a", "b", "a", "c", "d", "e", "f"] {
            glossary.add_term("term", "t", Some(ctx));
        }
        // "a" twice in a row is stored once; oldest entries fall off after five
        assert_eq!(glossary.get_context("term"), ["a", "c", "d", "e", "f"]);
        glossary.add_term("term", "t", Some(""));
        assert_eq!(glossary.get_context("term").len(), 5);
        assert!(glossary.get_context("other").is_empty());
    }

    #[test]
    fn test_remove_term_clears_everything() {
        let mut glossary = Glossary::new();
        glossary.add_term("ring", "anillo", Some("the ring glowed"));

        assert!(glossary.remove_term("ring"));
        assert!(!glossary.remove_term("ring"));
        assert!(!glossary.has_term("ring"));
        assert_eq!(glossary.get_usage_count("ring"), 0);
        assert!(glossary.get_context("ring").is_empty());
    }

    #[test]
    fn test_frequent_terms() {
        let mut glossary = Glossary::new();
        glossary.add_term("once", "una vez", None);
        glossary.add_term("twice", "dos veces", None);
        glossary.add_term("twice", "dos veces", None);

        let frequent = glossary.get_frequent_terms(2);
        assert_eq!(frequent.len(), 1);
        assert!(frequent.contains_key("twice"));
    }

    #[test]
    fn test_merge_prefers_existing_but_sums_usage() {
        let mut local = Glossary::new();
        local.add_term("king", "rey", None);
        local.add_term("king", "rey", None);

        let mut remote = Glossary::new();
        remote.add_term("king", "monarca", None);
        remote.add_term("king", "monarca", None);
        remote.add_term("king", "monarca", None);
        remote.add_term("queen", "reina", Some("the queen spoke"));

        local.merge(&remote, true);

        assert_eq!(local.get_translation("king"), Some("rey"));
        assert_eq!(local.get_usage_count("king"), 5);
        assert_eq!(local.get_translation("queen"), Some("reina"));
        assert_eq!(local.get_usage_count("queen"), 1);
        assert_eq!(local.get_context("queen"), ["the queen spoke"]);
    }

    #[test]
    fn test_merge_fills_placeholder_translations() {
        let mut local = Glossary::new();
        local.add_term("Elena", "", None);

        let mut remote = Glossary::new();
        remote.add_term("Elena", "Helena", None);

        local.merge(&remote, true);
        assert_eq!(local.get_translation("Elena"), Some("Helena"));
        // one local add, one from filling the placeholder, one remote
        assert_eq!(local.get_usage_count("Elena"), 3);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glossary.json");

        let mut glossary = Glossary::new();
        glossary.add_term("東京", "Tokyo", Some("東京に行く"));
        glossary.add_term("Aria", "", None);
        glossary.add_term("Aria", "", None);
        glossary.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("東京"), "non-ASCII must be written literally");
        assert!(content.contains("\"usage_count\""));

        let loaded = Glossary::from_file(&path, GlossaryOptions::default()).unwrap();
        assert_eq!(loaded.get_all_terms(), glossary.get_all_terms());
        assert_eq!(loaded.get_usage_count("Aria"), 2);
        assert_eq!(loaded.get_context("東京"), ["東京に行く"]);
        assert_eq!(loaded.get_entry("東京"), glossary.get_entry("東京"));
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();

        let mut glossary = Glossary::new();
        glossary.add_term("sword", "espada", None);

        assert!(matches!(
            glossary.load(dir.path().join("missing.json")),
            Err(HonyakuError::FileNotFound(_))
        ));
        assert!(glossary.load(&broken).is_err());
        assert_eq!(glossary.get_translation("sword"), Some("espada"));
    }

    #[test]
    fn test_load_replaces_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glossary.json");

        let mut saved = Glossary::new();
        saved.add_term("moon", "luna", None);
        saved.save(&path).unwrap();

        let mut glossary = Glossary::new();
        glossary.add_term("sun", "sol", None);
        glossary.load(&path).unwrap();

        assert!(!glossary.has_term("sun"));
        assert!(glossary.has_term("moon"));
    }

    #[test]
    fn test_find_similar_excludes_exact_match() {
        let mut glossary = Glossary::new();
        glossary.add_term("dragon", "dragón", None);
        glossary.add_term("Dragons", "dragones", None);
        glossary.add_term("wizard", "mago", None);

        let similar = glossary.find_similar_terms("Dragon", 5);
        assert!(!similar.contains(&"dragon".to_string()));
        assert!(similar.contains(&"Dragons".to_string()));
        assert!(!similar.contains(&"wizard".to_string()));
    }

    #[test]
    fn test_find_similar_by_character_overlap_ranked_by_usage() {
        let mut glossary = Glossary::new();
        glossary.add_term("listen", "escuchar", None);
        glossary.add_term("tinsel", "oropel", None);
        glossary.add_term("tinsel", "oropel", None);

        // Same letters as "silent", no substring relation
        let similar = glossary.find_similar_terms("silent", 5);
        assert_eq!(similar, vec!["tinsel".to_string(), "listen".to_string()]);
        assert_eq!(glossary.find_similar_terms("silent", 1).len(), 1);
        assert!(glossary.find_similar_terms("  ", 5).is_empty());
    }

    #[test]
    fn test_statistics() {
        let mut glossary = Glossary::new();
        assert_eq!(glossary.get_statistics().most_used_term, None);

        glossary.add_term("b", "B", Some("ctx"));
        glossary.add_term("b", "B", None);
        glossary.add_term("a", "A", None);
        glossary.add_term("c", "C", None);
        glossary.add_term("c", "C", None);

        let stats = glossary.get_statistics();
        assert_eq!(stats.total_terms, 3);
        assert_eq!(stats.total_usage, 5);
        assert!((stats.avg_usage - 1.67).abs() < 1e-9);
        // "b" and "c" tie; key order picks "b"
        assert_eq!(stats.most_used_term.as_deref(), Some("b"));
        assert_eq!(stats.most_used_count, 2);
        assert_eq!(stats.terms_with_context, 1);
        assert_eq!(glossary.to_string(), "Glossary(3 terms, avg_usage: 1.67)");
    }
}
