//! Users, authentication payloads and favorites.

use serde::{Deserialize, Serialize};

use super::{Email, ProductId, UserId};

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name shown in the session indicator.
    pub name: String,
    pub email: Email,
}

/// Payload of a successful `login` or `register` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    /// Bearer token issued by the data service.
    pub token: String,
}

/// A product pinned by a user.
///
/// Unique by `id` within one owner's set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: ProductId,
    pub name: String,
    pub owner_user_id: UserId,
}

/// Acknowledgement returned by mutating calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    pub message: Option<String>,
}

impl Confirmation {
    #[must_use]
    pub fn with_message(message: &str) -> Self {
        Self {
            message: Some(message.to_owned()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_wire_format() {
        let json = serde_json::json!({
            "id": "product789",
            "name": "Сыр",
            "ownerUserId": "user123"
        });
        let favorite: Favorite = serde_json::from_value(json).unwrap();
        assert_eq!(favorite.id.as_str(), "product789");
        assert_eq!(favorite.owner_user_id.as_str(), "user123");
    }

    #[test]
    fn test_confirmation_tolerates_missing_message() {
        let confirmation: Confirmation = serde_json::from_str("{}").unwrap();
        assert_eq!(confirmation, Confirmation::default());
    }
}
