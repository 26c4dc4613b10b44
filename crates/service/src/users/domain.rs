use serde::{Deserialize, Serialize};

use super::errors::UserError;

/// A persisted user record. `password` holds the PHC hash string, never the
/// plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Registration input (plaintext password).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl User {
    /// Shallow merge of `patch` over this record. `password` in the patch
    /// must already be hashed.
    pub(crate) fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
    }
}

/// What the HTTP layer renders for a user: everything but the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self { id: u.id, username: u.username, email: u.email }
    }
}

/// Presence check: a field is missing when absent or blank.
pub fn require(value: Option<String>, field: &str) -> Result<String, UserError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(UserError::Validation(format!("missing required field: {field}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: "1".into(),
            username: "a".into(),
            email: "a@x.com".into(),
            password: "$hash".into(),
        }
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut u = sample();
        u.apply(UserPatch { username: Some("b".into()), ..Default::default() });
        assert_eq!(u.username, "b");
        assert_eq!(u.email, "a@x.com");
        assert_eq!(u.password, "$hash");
        assert_eq!(u.id, "1");
    }

    #[test]
    fn public_view_drops_hash() {
        let json = serde_json::to_value(PublicUser::from(sample())).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@x.com");
    }

    #[test]
    fn require_rejects_absent_and_blank() {
        assert!(matches!(require(None, "email"), Err(UserError::Validation(_))));
        assert!(matches!(require(Some("  ".into()), "email"), Err(UserError::Validation(_))));
        assert_eq!(require(Some("x".into()), "email").unwrap(), "x");
    }
}
