//! Recipient resolution from the first word of a request
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Comma-joined mentions (`@bob,@carol`)
//! - 1.0.0: Initial release

use super::record::{TARGET_EVERYONE, TARGET_MYSELF};

/// Resolved recipient plus the message left after stripping the target word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target: String,
    pub message: String,
}

/// Which branch of the resolution table fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Setter,
    Everyone,
    Bot,
    Mentions,
    Fallback,
}

impl TargetKind {
    /// Branches that never need admin rights
    pub fn is_self_service(self) -> bool {
        matches!(
            self,
            TargetKind::Setter | TargetKind::Everyone | TargetKind::Bot
        )
    }
}

/// Classify the first token of a request (case-sensitive)
pub fn classify(first_token: &str) -> TargetKind {
    match first_token {
        "me" => TargetKind::Setter,
        "everyone" => TargetKind::Everyone,
        "yourself" => TargetKind::Bot,
        token if !mentions(token).is_empty() => TargetKind::Mentions,
        _ => TargetKind::Fallback,
    }
}

/// Names mentioned by a token like `@bob` or `@bob,@carol`
fn mentions(token: &str) -> Vec<&str> {
    let names: Vec<&str> = token
        .split(',')
        .filter_map(|part| part.strip_prefix('@'))
        .filter(|name| !name.is_empty())
        .collect();

    if names.len() == token.split(',').filter(|part| !part.is_empty()).count() {
        names
    } else {
        Vec::new()
    }
}

/// Decide who receives the reminder and what remains of the message
///
/// `message` is the full request text, first token included. Every
/// recognized branch strips that token; the fallback keeps the whole text
/// and addresses the setter.
pub fn resolve(first_token: &str, message: &str, set_by: &str) -> Resolution {
    let target = match classify(first_token) {
        TargetKind::Setter => set_by.to_string(),
        TargetKind::Everyone => TARGET_EVERYONE.to_string(),
        TargetKind::Bot => TARGET_MYSELF.to_string(),
        TargetKind::Mentions => mentions(first_token).join(", "),
        TargetKind::Fallback => {
            return Resolution {
                target: set_by.to_string(),
                message: message.to_string(),
            }
        }
    };

    // A message that does not start with the token is kept whole
    Resolution {
        target,
        message: message
            .strip_prefix(first_token)
            .unwrap_or(message)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_me() {
        let resolution = resolve("me", "me to grab a beer", "alice");
        assert_eq!(resolution.target, "alice");
        assert_eq!(resolution.message, " to grab a beer");
    }

    #[test]
    fn test_resolve_everyone() {
        let resolution = resolve("everyone", "everyone that strpbrk is a thing", "alice");
        assert_eq!(resolution.target, "everyone");
        assert_eq!(resolution.message, " that strpbrk is a thing");
    }

    #[test]
    fn test_resolve_yourself() {
        let resolution = resolve("yourself", "yourself that you are a bot", "alice");
        assert_eq!(resolution.target, "myself");
        assert_eq!(resolution.message, " that you are a bot");
    }

    #[test]
    fn test_resolve_mention() {
        let resolution = resolve("@bob", "@bob to check logs", "alice");
        assert_eq!(resolution.target, "bob");
        assert_eq!(resolution.message, " to check logs");
    }

    #[test]
    fn test_resolve_mention_keeps_message_without_token() {
        let resolution = resolve("@bob", "to check logs", "alice");
        assert_eq!(resolution.target, "bob");
        assert_eq!(resolution.message, "to check logs");
    }

    #[test]
    fn test_resolve_multiple_mentions() {
        let resolution = resolve("@bob,@carol", "@bob,@carol to deploy", "alice");
        assert_eq!(resolution.target, "bob, carol");
        assert_eq!(resolution.message, " to deploy");
    }

    #[test]
    fn test_fallback_keeps_whole_message() {
        let resolution = resolve("grab", "grab a beer", "alice");
        assert_eq!(resolution.target, "alice");
        assert_eq!(resolution.message, "grab a beer");
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(classify("Me"), TargetKind::Fallback);
        assert_eq!(classify("@"), TargetKind::Fallback);
        assert_eq!(classify("@bob,carol"), TargetKind::Fallback);
        assert!(TargetKind::Everyone.is_self_service());
        assert!(!TargetKind::Mentions.is_self_service());
    }
}
