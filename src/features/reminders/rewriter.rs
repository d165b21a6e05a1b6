//! Grammatical person rewriting
//!
//! Requests are written by the setter ("remind me that I am late"); the
//! reminder is spoken later by the bot, so pronouns and the verbs attached
//! to them have to change person.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Conjugate `be` by the person of the swapped subject
//! - 1.1.0: Closed token-class dispatch
//! - 1.0.0: Initial release

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::record::TARGET_EVERYONE;
use crate::features::tagger::{PartOfSpeechTagger, TaggedToken};

/// Tokens the rewriter reacts to; everything else is `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// `to` / `not`
    ToOrNot,
    /// `i`
    FirstPerson,
    /// `that`
    That,
    /// `yourself`
    Yourself,
    /// `he` / `she`
    ThirdPerson,
    Other,
}

impl TokenClass {
    pub fn of(token: &str) -> TokenClass {
        match token.to_lowercase().as_str() {
            "to" | "not" => TokenClass::ToOrNot,
            "i" => TokenClass::FirstPerson,
            "that" => TokenClass::That,
            "yourself" => TokenClass::Yourself,
            "he" | "she" => TokenClass::ThirdPerson,
            _ => TokenClass::Other,
        }
    }
}

/// Rewrites a tagged request into the voice of the bot
pub struct PronounRewriter<'a> {
    tagger: &'a dyn PartOfSpeechTagger,
}

impl<'a> PronounRewriter<'a> {
    pub fn new(tagger: &'a dyn PartOfSpeechTagger) -> Self {
        Self { tagger }
    }

    /// Rewrite `message` (tagged as `tokens`) for delivery to `target`
    pub fn rewrite(
        &self,
        message: &str,
        tokens: &[TaggedToken],
        target: &str,
        set_by: &str,
    ) -> String {
        let mut message = message.to_string();
        // Setter's name when the sentence is about the setter but read by someone else
        let third_party = if target == set_by { None } else { Some(set_by) };
        let mut voice: Option<&str> = None;

        for (index, part) in tokens.iter().enumerate() {
            let token = part.token.as_str();
            let previous = index
                .checked_sub(1)
                .and_then(|i| tokens.get(i))
                .map(|t| t.token.to_lowercase())
                .unwrap_or_default();
            let next = tokens.get(index + 1);
            voice = None;

            match TokenClass::of(token) {
                TokenClass::ToOrNot => {
                    if previous == "do" || index >= 3 {
                        continue;
                    }
                    if let Some(next) = next.filter(|n| matches!(n.token.as_str(), "to" | "not")) {
                        let pattern = format!(
                            r"\b{}\s+{}\b",
                            regex::escape(token),
                            regex::escape(&next.token)
                        );
                        message = replace_first(&message, &pattern, "don't");
                        continue;
                    }
                    voice = third_party;
                    // A leading "not" goes the same way as "to"
                    if voice.is_none() || target == TARGET_EVERYONE {
                        message = remove_word(&message, token);
                    }
                }
                TokenClass::FirstPerson => {
                    voice = third_party;
                    // Second-person reading is left to the final pass
                    if voice.is_some() {
                        if let Some(verb) = next {
                            message = self.conjugate(&message, verb);
                        }
                    }
                }
                TokenClass::That => {
                    let addresses_setter = target == TARGET_EVERYONE || target == set_by;
                    if previous == "about" {
                        if addresses_setter {
                            message = replace_word(&message, "about", "remember");
                        }
                        message = remove_word(&message, token);
                    } else if index == 0 || addresses_setter {
                        message = remove_word(&message, token);
                    }
                }
                TokenClass::Yourself => {
                    let rest = remove_word(&message, token);
                    return squeeze(&format!(
                        "I don't need to be reminded {}",
                        translate_pronouns(&rest, None, None)
                    ));
                }
                TokenClass::ThirdPerson => {
                    return squeeze(&translate_pronouns(&message, None, Some(set_by)));
                }
                TokenClass::Other => voice = third_party,
            }
        }

        squeeze(&translate_pronouns(&message, voice, None))
    }

    /// Put the verb following a first-person subject into third person
    fn conjugate(&self, message: &str, verb: &TaggedToken) -> String {
        let conjugated = if verb.tag.starts_with("HV*") {
            "hasn't".to_string()
        } else if verb.tag.starts_with("HV") {
            "has".to_string()
        } else {
            self.tagger.third_person(&verb.tag, &verb.token)
        };
        replace_word(message, &verb.token, &conjugated)
    }
}

fn pronoun_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)\b(?:
                (?P<first>i)(?:(?P<first_c>'m)|\s+(?P<first_v>am|was)(?P<first_n>n't)?)?
                |(?P<second>you|they)(?:(?P<second_c>'re)|\s+(?P<second_v>are|were)(?P<second_n>n't)?)?
                |(?P<third>it|he|she)(?:(?P<third_c>'s)|\s+(?P<third_v>is|was)(?P<third_n>n't)?)?
                |(?P<object>mine|me|yours?|(?:my|your|it|him|her)(?:self)?)
            )\b",
        )
        .expect("valid pronoun regex")
    })
}

/// Grammatical person of a (possibly swapped) subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Person {
    First,
    Second,
    Third,
    Plural,
}

impl Person {
    fn of(subject: &str) -> Person {
        match subject.to_lowercase().as_str() {
            "i" => Person::First,
            "you" => Person::Second,
            "they" | "we" => Person::Plural,
            _ => Person::Third,
        }
    }

    fn be(self, past: bool) -> &'static str {
        match (self, past) {
            (Person::First, false) => "am",
            (Person::Third, false) => "is",
            (Person::Second | Person::Plural, false) => "are",
            (Person::First | Person::Third, true) => "was",
            (Person::Second | Person::Plural, true) => "were",
        }
    }

    fn contraction(self) -> &'static str {
        match self {
            Person::First => "'m",
            Person::Third => "'s",
            Person::Second | Person::Plural => "'re",
        }
    }
}

fn is_pronoun(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "i" | "you" | "he" | "she" | "it" | "we" | "they"
    )
}

/// Swap first and second person pronouns and re-conjugate attached `be` forms
///
/// With `username`, first-person references become that user in the third
/// person instead of "you". With `set_by`, the sentence is spoken about a
/// third person to the reader, so `he`/`she` become "you" and first-person
/// references become the setter.
pub fn translate_pronouns(message: &str, username: Option<&str>, set_by: Option<&str>) -> String {
    let owner = username.or(set_by);

    pronoun_regex()
        .replace_all(message, |caps: &Captures| {
            let (object, verb, contracted, negated) = ["first", "second", "third"]
                .iter()
                .find_map(|group| {
                    let object = caps.name(group)?.as_str();
                    let contracted = caps.name(&format!("{group}_c"));
                    let verb = contracted.or_else(|| caps.name(&format!("{group}_v")));
                    let negated = caps.name(&format!("{group}_n")).is_some();
                    Some((object, verb.map(|v| v.as_str()), contracted.is_some(), negated))
                })
                .or_else(|| caps.name("object").map(|m| (m.as_str(), None, false, false)))
                .unwrap_or((&caps[0], None, false, false));

            let swapped = match object.to_lowercase().as_str() {
                "i" => set_by.or(username).unwrap_or("you").to_string(),
                "you" if verb.is_some() => "I".to_string(),
                "you" => "me".to_string(),
                "me" => owner.unwrap_or("you").to_string(),
                "my" => owner.map_or("your".to_string(), |u| format!("{u}'s")),
                "mine" => owner.map_or("yours".to_string(), |u| format!("{u}'s")),
                "myself" if username.is_some() => "him/herself".to_string(),
                "myself" => "yourself".to_string(),
                "yourself" => "myself".to_string(),
                "your" => "my".to_string(),
                "yours" => "mine".to_string(),
                "he" | "she" if username.is_none() => "you".to_string(),
                "himself" | "herself" if username.is_none() => "yourself".to_string(),
                _ => object.to_string(),
            };

            let Some(verb) = verb else {
                return swapped;
            };

            let person = Person::of(&swapped);
            let past = matches!(verb.to_lowercase().as_str(), "was" | "were");
            let form = person.be(past);

            if contracted && is_pronoun(&swapped) {
                format!("{swapped}{}", person.contraction())
            } else if negated && form == "am" {
                format!("{swapped} am not")
            } else if negated {
                format!("{swapped} {form}n't")
            } else {
                format!("{swapped} {form}")
            }
        })
        .into_owned()
}

/// Replace the first match of `pattern` in `text`
fn replace_first(text: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replacen(text, 1, regex::NoExpand(replacement)).into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Replace the first whole-word occurrence of `word`
fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    replace_first(text, &format!(r"\b{}\b", regex::escape(word)), replacement)
}

/// Remove the first whole-word occurrence of `word`
fn remove_word(text: &str, word: &str) -> String {
    replace_word(text, word, "")
}

/// Collapse runs of whitespace left behind by removals
fn squeeze(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
