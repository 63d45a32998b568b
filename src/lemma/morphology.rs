//! Morphological analysis: word form → (part of speech, normal form)

use super::Language;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Closed set of grammatical classes reported by a morphology backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Infinitive,
    Adjective,
    ShortAdjective,
    Participle,
    Gerund,
    Adverb,
    Pronoun,
    Numeral,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
    Unknown,
}

impl PartOfSpeech {
    /// Classes that carry no lexical meaning and are never indexed
    pub const FUNCTION_WORDS: [PartOfSpeech; 4] = [
        PartOfSpeech::Interjection,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Preposition,
        PartOfSpeech::Particle,
    ];

    pub fn is_function_word(self) -> bool {
        Self::FUNCTION_WORDS.contains(&self)
    }
}

impl FromStr for PartOfSpeech {
    type Err = Error;

    /// Accepts universal tags (NOUN, ADP, ...) as well as the Russian AOT
    /// tags (С, Г, ПРЕДЛ, ...) found in common dictionary dumps.
    fn from_str(s: &str) -> Result<Self> {
        let pos = match s.trim().to_uppercase().as_str() {
            "NOUN" | "С" => PartOfSpeech::Noun,
            "VERB" | "Г" => PartOfSpeech::Verb,
            "INF" | "ИНФИНИТИВ" => PartOfSpeech::Infinitive,
            "ADJ" | "П" => PartOfSpeech::Adjective,
            "ADJS" | "КР_ПРИЛ" => PartOfSpeech::ShortAdjective,
            "PARTICIPLE" | "ПРИЧАСТИЕ" => PartOfSpeech::Participle,
            "GERUND" | "ДЕЕПРИЧАСТИЕ" => PartOfSpeech::Gerund,
            "ADV" | "Н" => PartOfSpeech::Adverb,
            "PRON" | "МС" => PartOfSpeech::Pronoun,
            "NUM" | "ЧИСЛ" => PartOfSpeech::Numeral,
            "ADP" | "PREP" | "ПРЕДЛ" => PartOfSpeech::Preposition,
            "CONJ" | "CCONJ" | "SCONJ" | "СОЮЗ" => PartOfSpeech::Conjunction,
            "PART" | "PRT" | "PARTICLE" | "ЧАСТ" => PartOfSpeech::Particle,
            "INTJ" | "МЕЖД" => PartOfSpeech::Interjection,
            "X" | "UNKNOWN" => PartOfSpeech::Unknown,
            other => {
                return Err(Error::Morphology(format!(
                    "Unknown part-of-speech tag: {}",
                    other
                )))
            }
        };
        Ok(pos)
    }
}

/// One grammatical reading of a word form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub part_of_speech: PartOfSpeech,
    pub normal_form: String,
}

impl Analysis {
    pub fn new(part_of_speech: PartOfSpeech, normal_form: impl Into<String>) -> Self {
        Self {
            part_of_speech,
            normal_form: normal_form.into(),
        }
    }
}

/// Morphology backend contract
///
/// Given a lower-cased word, returns every reading of it. An empty vector
/// means the word is not recognized and will not be indexed.
pub trait Morphology: Send + Sync {
    fn analyze(&self, word: &str) -> Vec<Analysis>;
}

/// Dictionary-backed morphology
///
/// Ships the language's function words and optionally loads a tab-separated
/// dictionary (`form<TAB>lemma<TAB>tag`, `#` comments allowed). Forms missing
/// from the dictionary are reduced by the language's Snowball stemmer.
#[derive(Debug, Clone)]
pub struct DictionaryMorphology {
    language: Language,
    entries: HashMap<String, Vec<Analysis>>,
}

impl DictionaryMorphology {
    /// Create a morphology that only knows the built-in function words
    pub fn new(language: Language) -> Self {
        let mut morphology = Self {
            language,
            entries: HashMap::new(),
        };
        for (word, pos) in language.function_words() {
            morphology.insert(word, word, *pos);
        }
        morphology
    }

    /// Create a morphology and load a dictionary file into it
    pub fn load(language: Language, path: &Path) -> Result<Self> {
        debug!("Loading morphology dictionary from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut morphology = Self::new(language);
        let count = morphology.parse_entries(&content)?;
        info!(
            "Loaded {} {} dictionary entries from {:?}",
            count, language, path
        );
        Ok(morphology)
    }

    /// Add one reading for a word form
    pub fn insert(&mut self, form: &str, normal_form: &str, pos: PartOfSpeech) {
        let analysis = Analysis::new(pos, normal_form.to_lowercase());
        let readings = self.entries.entry(form.to_lowercase()).or_default();
        if !readings.contains(&analysis) {
            readings.push(analysis);
        }
    }

    /// Parse dictionary lines, returning the number of entries added
    pub fn parse_entries(&mut self, content: &str) -> Result<usize> {
        let mut count = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let (Some(form), Some(lemma), Some(tag)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(Error::Morphology(format!(
                    "line {}: expected form<TAB>lemma<TAB>tag",
                    line_no + 1
                )));
            };

            let pos: PartOfSpeech = tag
                .parse()
                .map_err(|e| Error::Morphology(format!("line {}: {}", line_no + 1, e)))?;
            self.insert(form.trim(), lemma.trim(), pos);
            count += 1;
        }
        Ok(count)
    }
}

impl Morphology for DictionaryMorphology {
    fn analyze(&self, word: &str) -> Vec<Analysis> {
        match self.entries.get(word) {
            Some(readings) => readings.clone(),
            None => {
                let stem = self.language.stemmer().stem(word).into_owned();
                vec![Analysis::new(PartOfSpeech::Unknown, stem)]
            }
        }
    }
}
