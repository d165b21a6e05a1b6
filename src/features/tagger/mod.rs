//! # Feature: Part-of-Speech Tagging
//!
//! Tagger seam used by the pronoun rewriter, plus a small lexicon-based
//! tagger using Brown-corpus style tags.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod lexicon;

pub use lexicon::LexiconTagger;

/// One token of a message with its part-of-speech tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(token: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            tag: tag.into(),
        }
    }
}

/// Part-of-speech labeller
pub trait PartOfSpeechTagger: Send + Sync {
    /// Tag every token of `text`, in order
    fn tag(&self, text: &str) -> Vec<TaggedToken>;

    /// Conjugate `verb` (tagged `tag`) to third person singular present;
    /// returns the verb unchanged when it cannot be conjugated
    fn third_person(&self, tag: &str, verb: &str) -> String;
}
