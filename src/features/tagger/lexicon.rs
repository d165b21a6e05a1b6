//! Lexicon tagger
//!
//! Closed-class words come from a fixed table; open-class words are guessed
//! from suffixes and from the tag of the previous token.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use regex::Regex;
use std::sync::OnceLock;

use super::{PartOfSpeechTagger, TaggedToken};

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w@'-]+|[^\s\w]").expect("valid token regex"))
}

/// Tags for closed-class words
fn lexicon_tag(word: &str) -> Option<&'static str> {
    let tag = match word {
        "i" | "we" | "they" | "you" => "PPSS",
        "he" | "she" | "it" => "PPS",
        "me" | "him" | "us" | "them" => "PPO",
        "my" | "your" | "his" | "her" | "our" | "their" | "its" => "PP$",
        "mine" | "yours" | "ours" | "theirs" => "PP$$",
        "myself" | "yourself" | "himself" | "herself" | "itself" => "PPL",
        "to" => "TO",
        "not" | "n't" | "never" => "*",
        "do" => "DO",
        "does" => "DOZ",
        "did" => "DOD",
        "don't" => "DO*",
        "have" => "HV",
        "has" => "HVZ",
        "had" => "HVD",
        "haven't" => "HV*",
        "be" => "BE",
        "am" => "BEM",
        "is" => "BEZ",
        "are" => "BER",
        "was" => "BEDZ",
        "were" => "BED",
        "that" => "CS",
        "about" | "in" | "at" | "on" | "for" | "with" | "of" | "from" | "by" => "IN",
        "a" | "an" | "the" => "AT",
        "this" | "these" | "those" => "DT",
        "and" | "or" | "but" => "CC",
        "will" | "can" | "should" | "must" | "would" | "could" | "may" | "might" | "shall" => {
            "MD"
        }
        _ => return None,
    };
    Some(tag)
}

/// Bundled tagger, good enough for short imperative reminder texts
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconTagger;

impl LexiconTagger {
    pub fn new() -> Self {
        LexiconTagger
    }

    fn guess(word: &str, previous_tag: Option<&str>) -> String {
        if word.chars().all(|c| c.is_ascii_digit()) {
            return "CD".to_string();
        }
        if !word.chars().any(char::is_alphanumeric) {
            return word.to_string();
        }

        let after_subject = matches!(
            previous_tag,
            Some("TO" | "PPSS" | "MD" | "DO" | "DO*" | "*")
        );
        let tag = if after_subject {
            "VB"
        } else if previous_tag == Some("PPS") && word.ends_with('s') {
            "VBZ"
        } else if word.ends_with("ing") {
            "VBG"
        } else if word.ends_with("ed") {
            "VBD"
        } else if word.ends_with("ly") {
            "RB"
        } else {
            "NN"
        };
        tag.to_string()
    }
}

impl PartOfSpeechTagger for LexiconTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let mut tokens: Vec<TaggedToken> = Vec::new();

        for word in token_regex().find_iter(text) {
            let word = word.as_str();
            let lower = word.to_lowercase();
            let tag = match lexicon_tag(&lower) {
                Some(tag) => tag.to_string(),
                None => Self::guess(&lower, tokens.last().map(|t| t.tag.as_str())),
            };
            tokens.push(TaggedToken::new(word, tag));
        }

        tokens
    }

    fn third_person(&self, tag: &str, verb: &str) -> String {
        let irregular = match verb.to_lowercase().as_str() {
            "be" | "am" | "are" => Some("is"),
            "have" => Some("has"),
            "haven't" => Some("hasn't"),
            "do" => Some("does"),
            "don't" => Some("doesn't"),
            "go" => Some("goes"),
            _ => None,
        };
        if let Some(form) = irregular {
            return form.to_string();
        }

        if tag != "VB" && tag != "VBP" {
            return verb.to_string();
        }

        let lower = verb.to_lowercase();
        let ends_with_consonant_y = lower.ends_with('y')
            && lower
                .chars()
                .rev()
                .nth(1)
                .is_some_and(|c| !"aeiou".contains(c));

        if ends_with_consonant_y {
            format!("{}ies", &verb[..verb.len() - 1])
        } else if ["s", "x", "z", "ch", "sh", "o"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
        {
            format!("{verb}es")
        } else {
            format!("{verb}s")
        }
    }
}
