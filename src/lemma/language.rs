//! Indexing languages: alphabet, stemming algorithm and closed-class word lists

use super::PartOfSpeech::{self, Conjunction, Interjection, Particle, Preposition};
use crate::error::{Error, Result};
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The single language a deployment indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Russian,
    English,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Russian => write!(f, "russian"),
            Language::English => write!(f, "english"),
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "russian" | "ru" => Ok(Language::Russian),
            "english" | "en" => Ok(Language::English),
            _ => Err(Error::Config(format!("Unknown language: {}", s))),
        }
    }
}

impl Language {
    /// Regex character class matching everything except lower-case letters and whitespace
    pub(crate) fn non_letter_pattern(&self) -> &'static str {
        match self {
            Language::Russian => r"[^а-яё\s]",
            Language::English => r"[^a-z\s]",
        }
    }

    /// Snowball stemmer used for words missing from the dictionary
    pub fn stemmer(&self) -> Stemmer {
        match self {
            Language::Russian => Stemmer::create(Algorithm::Russian),
            Language::English => Stemmer::create(Algorithm::English),
        }
    }

    /// Built-in prepositions, conjunctions, particles and interjections
    pub fn function_words(&self) -> &'static [(&'static str, PartOfSpeech)] {
        match self {
            Language::Russian => RUSSIAN_FUNCTION_WORDS,
            Language::English => ENGLISH_FUNCTION_WORDS,
        }
    }
}

const RUSSIAN_FUNCTION_WORDS: &[(&str, PartOfSpeech)] = &[
    ("без", Preposition),
    ("в", Preposition),
    ("во", Preposition),
    ("для", Preposition),
    ("до", Preposition),
    ("за", Preposition),
    ("из", Preposition),
    ("изо", Preposition),
    ("к", Preposition),
    ("ко", Preposition),
    ("между", Preposition),
    ("на", Preposition),
    ("над", Preposition),
    ("о", Preposition),
    ("об", Preposition),
    ("обо", Preposition),
    ("от", Preposition),
    ("перед", Preposition),
    ("по", Preposition),
    ("под", Preposition),
    ("при", Preposition),
    ("про", Preposition),
    ("с", Preposition),
    ("со", Preposition),
    ("у", Preposition),
    ("через", Preposition),
    ("а", Conjunction),
    ("и", Conjunction),
    ("или", Conjunction),
    ("но", Conjunction),
    ("да", Conjunction),
    ("что", Conjunction),
    ("чтобы", Conjunction),
    ("если", Conjunction),
    ("когда", Conjunction),
    ("хотя", Conjunction),
    ("либо", Conjunction),
    ("зато", Conjunction),
    ("однако", Conjunction),
    ("поэтому", Conjunction),
    ("потому", Conjunction),
    ("будто", Conjunction),
    ("словно", Conjunction),
    ("не", Particle),
    ("ни", Particle),
    ("же", Particle),
    ("бы", Particle),
    ("ли", Particle),
    ("вот", Particle),
    ("вон", Particle),
    ("даже", Particle),
    ("лишь", Particle),
    ("только", Particle),
    ("ведь", Particle),
    ("разве", Particle),
    ("неужели", Particle),
    ("пусть", Particle),
    ("пускай", Particle),
    ("уж", Particle),
    ("ах", Interjection),
    ("ох", Interjection),
    ("эх", Interjection),
    ("ой", Interjection),
    ("ай", Interjection),
    ("увы", Interjection),
    ("ура", Interjection),
    ("эй", Interjection),
    ("ого", Interjection),
    ("ух", Interjection),
    ("ну", Interjection),
    ("ага", Interjection),
    ("угу", Interjection),
];

const ENGLISH_FUNCTION_WORDS: &[(&str, PartOfSpeech)] = &[
    ("about", Preposition),
    ("above", Preposition),
    ("after", Preposition),
    ("at", Preposition),
    ("before", Preposition),
    ("behind", Preposition),
    ("below", Preposition),
    ("between", Preposition),
    ("by", Preposition),
    ("during", Preposition),
    ("for", Preposition),
    ("from", Preposition),
    ("in", Preposition),
    ("into", Preposition),
    ("of", Preposition),
    ("on", Preposition),
    ("over", Preposition),
    ("through", Preposition),
    ("to", Preposition),
    ("toward", Preposition),
    ("under", Preposition),
    ("upon", Preposition),
    ("with", Preposition),
    ("within", Preposition),
    ("without", Preposition),
    ("and", Conjunction),
    ("or", Conjunction),
    ("but", Conjunction),
    ("nor", Conjunction),
    ("yet", Conjunction),
    ("so", Conjunction),
    ("because", Conjunction),
    ("although", Conjunction),
    ("though", Conjunction),
    ("if", Conjunction),
    ("unless", Conjunction),
    ("while", Conjunction),
    ("whereas", Conjunction),
    ("than", Conjunction),
    ("whether", Conjunction),
    ("not", Particle),
    ("oh", Interjection),
    ("ah", Interjection),
    ("wow", Interjection),
    ("hey", Interjection),
    ("oops", Interjection),
    ("alas", Interjection),
    ("ouch", Interjection),
    ("hmm", Interjection),
    ("hello", Interjection),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("RU".parse::<Language>().unwrap(), Language::Russian);
        assert_eq!("english".parse::<Language>().unwrap(), Language::English);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_stemmer_matches_language() {
        assert_eq!(Language::English.stemmer().stem("running"), "run");
        assert_eq!(Language::Russian.stemmer().stem("кошками"), "кошк");
    }
}
