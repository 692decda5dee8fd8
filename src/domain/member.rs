use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MemberId = Uuid;

/// A person taking part in a group. Identity is the `id`; name and email are
/// display attributes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
        }
    }

    pub fn with_id(mut self, id: MemberId) -> Self {
        self.id = id;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Names are matched case-insensitively, ignoring surrounding whitespace.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

impl std::fmt::Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{}>", self.name, email),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_builder() {
        let id = Uuid::new_v4();
        let member = Member::new("Alice").with_id(id).with_email("alice@example.com");

        assert_eq!(member.id, id);
        assert_eq!(member.name, "Alice");
        assert_eq!(member.email.as_deref(), Some("alice@example.com"));
        assert_eq!(member.to_string(), "Alice <alice@example.com>");
    }

    #[test]
    fn test_matches_name() {
        let member = Member::new("Alice");
        assert!(member.matches_name("alice"));
        assert!(member.matches_name(" ALICE "));
        assert!(!member.matches_name("Bob"));
    }

    #[test]
    fn test_email_is_optional_in_json() {
        let json = r#"{"id":"6f1c1a52-8a3e-4f4e-9d5c-2f7b9c1d0a11","name":"Bob"}"#;
        let member: Member = serde_json::from_str(json).unwrap();
        assert_eq!(member.name, "Bob");
        assert!(member.email.is_none());
    }
}
