use std::collections::BTreeSet;

use crate::keywords::{KeywordSet, normalize, tokenize};

/// Keyword coverage of the transcript heard since the active slide started.
///
/// Matches are sticky: once a keyword is heard it stays matched until the
/// next `activate`, so coverage never decreases for a fixed slide.
#[derive(Debug, Default)]
pub struct TranscriptScorer {
    keywords: KeywordSet,
    matched: BTreeSet<String>,
    transcript: String,
}

impl TranscriptScorer {
    pub fn new(keywords: KeywordSet) -> Self {
        Self {
            keywords,
            ..Default::default()
        }
    }

    pub fn activate(&mut self, keywords: KeywordSet) {
        self.keywords = keywords;
        self.matched.clear();
        self.transcript.clear();
    }

    /// Interim fragments count toward coverage; only final ones are kept in
    /// the transcript.
    pub fn push(&mut self, fragment: &str, is_final: bool) -> Option<f64> {
        let normalized = normalize(fragment);
        for token in tokenize(&normalized) {
            if self.keywords.contains(token) && !self.matched.contains(token) {
                self.matched.insert(token.to_string());
            }
        }

        if is_final {
            let fragment = fragment.trim();
            if !fragment.is_empty() {
                if !self.transcript.is_empty() {
                    self.transcript.push(' ');
                }
                self.transcript.push_str(fragment);
            }
        }

        self.coverage()
    }

    /// `None` when the active slide has nothing to match.
    pub fn coverage(&self) -> Option<f64> {
        if self.keywords.is_empty() {
            return None;
        }
        Some((self.matched.len() as f64 / self.keywords.len() as f64).clamp(0.0, 1.0))
    }

    pub fn matched(&self) -> impl Iterator<Item = &str> {
        self.matched.iter().map(String::as_str)
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}
