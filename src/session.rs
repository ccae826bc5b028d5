use std::fmt;
use uuid::Uuid;

/// Opaque token that scopes server-side conversation memory to one client session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unique session id
    pub fn generate() -> Self {
        Self(format!("session-{}", Uuid::new_v4()))
    }

    /// Use an id supplied by the user, falling back to a generated one when blank
    pub fn from_user(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("session-"));
    }

    #[test]
    fn user_supplied_id_is_kept() {
        let id = SessionId::from_user(Some(" demo-session "));
        assert_eq!(id.as_str(), "demo-session");
    }

    #[test]
    fn blank_user_id_generates() {
        let id = SessionId::from_user(Some("   "));
        assert!(id.as_str().starts_with("session-"));
        assert!(SessionId::from_user(None).as_str().starts_with("session-"));
    }
}
