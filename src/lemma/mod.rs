//! Text normalization into lemma counts
//!
//! The pipeline lower-cases text, blanks out everything that is not a letter
//! of the configured language, splits on whitespace, drops function words
//! and counts the first normal form of every remaining word.

mod language;
mod morphology;

pub use language::*;
pub use morphology::*;

use crate::config::MorphologyConfig;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Lemma → occurrence count
pub type LemmaCounts = HashMap<String, u32>;

/// Stateless text-to-lemma converter, cheap to clone and share
#[derive(Clone)]
pub struct Lemmatizer {
    morphology: Arc<dyn Morphology>,
    non_letters: Regex,
}

impl Lemmatizer {
    /// Create a lemmatizer over an arbitrary morphology backend
    pub fn new(language: Language, morphology: Arc<dyn Morphology>) -> Result<Self> {
        let non_letters = Regex::new(language.non_letter_pattern())
            .map_err(|e| Error::Morphology(format!("invalid alphabet pattern: {}", e)))?;
        Ok(Self {
            morphology,
            non_letters,
        })
    }

    /// Build the dictionary-backed lemmatizer described by the configuration
    pub fn from_config(config: &MorphologyConfig) -> Result<Self> {
        let morphology = match &config.dictionary_path {
            Some(path) => DictionaryMorphology::load(config.language, path)?,
            None => DictionaryMorphology::new(config.language),
        };
        Self::new(config.language, Arc::new(morphology))
    }

    /// Count the lemmas of every indexable word in `text`
    pub fn text_to_lemmas(&self, text: &str) -> LemmaCounts {
        let mut counts = LemmaCounts::new();
        for word in self.words(text) {
            if let Some(lemma) = self.lemmatize_word(&word) {
                *counts.entry(lemma).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Normal form of a lower-cased word, or `None` when it is not indexed
    pub fn lemmatize_word(&self, word: &str) -> Option<String> {
        let readings = self.morphology.analyze(word);
        if readings
            .iter()
            .any(|r| r.part_of_speech.is_function_word())
        {
            return None;
        }
        readings
            .into_iter()
            .map(|r| r.normal_form)
            .find(|form| !form.is_empty())
    }

    fn words(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.non_letters
            .replace_all(&lowered, " ")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> Lemmatizer {
        let mut morph = DictionaryMorphology::new(Language::English);
        morph
            .parse_entries("cats\tcat\tNOUN\ndogs\tdog\tNOUN\nsat\tsit\tVERB\n")
            .unwrap();
        Lemmatizer::new(Language::English, Arc::new(morph)).unwrap()
    }

    #[test]
    fn test_counts_normal_forms() {
        let lemmatizer = english();
        let counts = lemmatizer.text_to_lemmas("Cats and a cat sat, the DOGS sat!");
        assert_eq!(counts.get("cat"), Some(&2));
        assert_eq!(counts.get("sit"), Some(&2));
        assert_eq!(counts.get("dog"), Some(&1));
        assert_eq!(counts.get("and"), None);
    }

    #[test]
    fn test_counts_sum_to_retained_words() {
        let lemmatizer = english();
        let text = "The cat sat on the mat with two dogs, oh well.";
        let counts = lemmatizer.text_to_lemmas(text);
        // the, cat, sat, the, mat, two, dogs, well; "on", "with", "oh" are dropped
        let total: u32 = counts.values().sum();
        assert_eq!(total, 8);
    }

    #[test]
    fn test_non_letters_split_words() {
        let lemmatizer = english();
        let counts = lemmatizer.text_to_lemmas("cat-dog 42cats <b>cat</b>");
        assert_eq!(counts.get("cat"), Some(&3));
        assert_eq!(counts.get("dog"), Some(&1));
        assert_eq!(counts.get("b"), Some(&2));
    }

    #[test]
    fn test_only_function_words_is_empty() {
        let lemmatizer = english();
        assert!(lemmatizer.text_to_lemmas("and or but").is_empty());
        assert!(lemmatizer.text_to_lemmas("   ").is_empty());
        assert!(lemmatizer.text_to_lemmas("12345 !!!").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let lemmatizer = english();
        let text = "Dogs chase cats; cats chase mice.";
        assert_eq!(lemmatizer.text_to_lemmas(text), lemmatizer.text_to_lemmas(text));
    }

    #[test]
    fn test_russian_alphabet() {
        let lemmatizer =
            Lemmatizer::from_config(&MorphologyConfig::default()).unwrap();
        let counts = lemmatizer.text_to_lemmas("Ёлка и ёжик в лесу, hello world!");
        assert_eq!(counts.values().sum::<u32>(), 3);
        assert!(!counts.contains_key("и"));
        assert!(!counts.contains_key("в"));
        assert!(counts.keys().all(|lemma| !lemma.is_ascii()));
    }

    #[test]
    fn test_default_morphology_collapses_inflections() {
        let lemmatizer =
            Lemmatizer::from_config(&MorphologyConfig::default()).unwrap();
        let counts = lemmatizer.text_to_lemmas("Кошка, кошки, кошку и кошкой");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.values().next(), Some(&4));

        let english = MorphologyConfig {
            language: Language::English,
            dictionary_path: None,
        };
        let counts = Lemmatizer::from_config(&english)
            .unwrap()
            .text_to_lemmas("connect connected connecting connection");
        assert_eq!(counts.get("connect"), Some(&4));
    }

    #[test]
    fn test_any_function_reading_discards_word() {
        let mut morph = DictionaryMorphology::new(Language::English);
        morph.insert("like", "like", PartOfSpeech::Verb);
        morph.insert("like", "like", PartOfSpeech::Preposition);
        let lemmatizer = Lemmatizer::new(Language::English, Arc::new(morph)).unwrap();
        assert!(lemmatizer.text_to_lemmas("like").is_empty());
    }

    #[test]
    fn test_concurrent_use() {
        let lemmatizer = english();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let l = lemmatizer.clone();
                std::thread::spawn(move || l.text_to_lemmas("cats dogs cats"))
            })
            .collect();
        for handle in handles {
            let counts = handle.join().unwrap();
            assert_eq!(counts.get("cat"), Some(&2));
        }
    }
}
