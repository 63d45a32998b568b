//! Snippet selection and term highlighting

use crate::parse::split_sentences;
use std::ops::Range;

/// Wraps matched query terms in emphasis markers
#[derive(Debug, Clone)]
pub struct Highlighter {
    open: String,
    close: String,
}

impl Highlighter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Best sentence of `text` for `query`, with every term occurrence marked
    ///
    /// For each query term the first sentence containing it is a candidate;
    /// the candidate containing the most distinct terms wins, ties going to
    /// the one found first. Empty when no sentence mentions any term.
    pub fn snippet(&self, text: &str, query: &str) -> String {
        let terms = query_terms(query);
        if terms.is_empty() {
            return String::new();
        }

        let sentences = split_sentences(text);
        let mut candidates: Vec<usize> = Vec::new();
        for term in &terms {
            let first = sentences
                .iter()
                .position(|sentence| !find_all(sentence, term).is_empty());
            if let Some(index) = first {
                if !candidates.contains(&index) {
                    candidates.push(index);
                }
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for index in candidates {
            let matched = terms
                .iter()
                .filter(|term| !find_all(sentences[index], term).is_empty())
                .count();
            if best.map_or(true, |(_, most)| matched > most) {
                best = Some((index, matched));
            }
        }

        match best {
            Some((index, _)) => self.highlight(sentences[index], &terms),
            None => String::new(),
        }
    }

    /// Mark every occurrence of `terms` in `sentence`, keeping its casing
    pub fn highlight(&self, sentence: &str, terms: &[String]) -> String {
        let mut ranges: Vec<Range<usize>> = terms
            .iter()
            .flat_map(|term| find_all(sentence, term))
            .collect();
        ranges.sort_by_key(|r| r.start);

        // Merge overlapping or touching matches
        let mut merged: Vec<Range<usize>> = Vec::new();
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }

        let mut out = String::with_capacity(sentence.len() + merged.len() * 8);
        let mut cursor = 0;
        for range in merged {
            out.push_str(&sentence[cursor..range.start]);
            out.push_str(&self.open);
            out.push_str(&sentence[range.clone()]);
            out.push_str(&self.close);
            cursor = range.end;
        }
        out.push_str(&sentence[cursor..]);
        out
    }
}

/// Distinct lower-cased whitespace-separated query terms, edge punctuation trimmed
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query.split_whitespace() {
        let term = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Byte ranges of case-insensitive, non-overlapping occurrences of a lower-cased term
fn find_all(haystack: &str, term: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    if term.is_empty() {
        return found;
    }

    let mut start = 0;
    while start < haystack.len() {
        match match_at(haystack, start, term) {
            Some(end) => {
                found.push(start..end);
                start = end;
            }
            None => {
                start += haystack[start..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    found
}

/// End of the match of `term` starting at byte `start`, if any
fn match_at(haystack: &str, start: usize, term: &str) -> Option<usize> {
    let mut chars = haystack[start..].char_indices();
    let mut end = start;
    for expected in term.chars() {
        let (offset, c) = chars.next()?;
        if !c.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = start + offset + c.len_utf8();
    }
    Some(end)
}
