//! Payload types for Clerk user webhooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type the user-provisioning webhook acts on.
pub const USER_CREATED_EVENT: &str = "user.created";

/// Auth provider recorded on users provisioned from Clerk.
pub const CLERK_AUTH_PROVIDER: &str = "clerk";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkWebhookEvent {
    #[serde(default)]
    pub data: ClerkUser,
    #[serde(default)]
    pub object: String,
    #[serde(default, rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClerkUser {
    #[serde(default)]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkEmailAddress {
    pub email_address: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub verification: ClerkEmailVerification,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClerkEmailVerification {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub strategy: String,
}

impl ClerkUser {
    /// First verified address, falling back to the first address on file.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .iter()
            .find(|e| e.verification.status == "verified")
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.as_str())
    }

    /// `"{first} {last}"` with missing parts dropped; `"User"` when both are absent.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            "User".to_string()
        } else {
            name
        }
    }

    /// Clerk creation time; `None` when the payload omits it.
    #[must_use]
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        millis_to_time(self.created_at)
    }

    #[must_use]
    pub fn updated_at_time(&self) -> Option<DateTime<Utc>> {
        millis_to_time(self.updated_at)
    }
}

fn millis_to_time(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(address: &str, status: &str) -> ClerkEmailAddress {
        ClerkEmailAddress {
            email_address: address.to_string(),
            id: format!("idn_{address}"),
            verification: ClerkEmailVerification {
                status: status.to_string(),
                strategy: "email_code".to_string(),
            },
        }
    }

    #[test]
    fn primary_email_prefers_verified_address() {
        let user = ClerkUser {
            email_addresses: vec![
                email("first@example.com", "unverified"),
                email("second@example.com", "verified"),
            ],
            ..ClerkUser::default()
        };
        assert_eq!(user.primary_email(), Some("second@example.com"));
    }

    #[test]
    fn primary_email_falls_back_to_first_address() {
        let user = ClerkUser {
            email_addresses: vec![
                email("first@example.com", "unverified"),
                email("second@example.com", "expired"),
            ],
            ..ClerkUser::default()
        };
        assert_eq!(user.primary_email(), Some("first@example.com"));
    }

    #[test]
    fn primary_email_is_none_without_addresses() {
        assert_eq!(ClerkUser::default().primary_email(), None);
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let user = ClerkUser {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            ..ClerkUser::default()
        };
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn full_name_uses_single_part_without_padding() {
        let user = ClerkUser {
            last_name: Some("Lovelace".to_string()),
            ..ClerkUser::default()
        };
        assert_eq!(user.full_name(), "Lovelace");
    }

    #[test]
    fn full_name_defaults_to_user() {
        assert_eq!(ClerkUser::default().full_name(), "User");
    }

    #[test]
    fn webhook_event_deserializes_clerk_payload() {
        let raw = r#"{
            "data": {
                "id": "user_29w83sxmDNGwOuEthce5gg56FcC",
                "first_name": "Example",
                "last_name": null,
                "email_addresses": [{
                    "email_address": "example@example.org",
                    "id": "idn_29w83yL7CwVlJXylYLxcslromF1",
                    "verification": {"status": "verified", "strategy": "ticket"}
                }],
                "image_url": null,
                "created_at": 1654012591514,
                "updated_at": 1654012591835,
                "external_id": null
            },
            "object": "event",
            "type": "user.created",
            "timestamp": 1654012591835,
            "instance_id": "ins_123"
        }"#;

        let event: ClerkWebhookEvent = serde_json::from_str(raw).expect("parse event");
        assert_eq!(event.event_type, USER_CREATED_EVENT);
        assert_eq!(event.data.id, "user_29w83sxmDNGwOuEthce5gg56FcC");
        assert_eq!(event.data.full_name(), "Example");
        assert_eq!(event.data.primary_email(), Some("example@example.org"));
        assert!(event.data.created_at_time().is_some());
        assert!(ClerkUser::default().created_at_time().is_none());
    }

    #[test]
    fn webhook_event_tolerates_missing_type_and_data() {
        let event: ClerkWebhookEvent = serde_json::from_str(r#"{"object": "event"}"#)
            .expect("missing fields default");
        assert!(event.event_type.is_empty());
        assert!(event.data.id.is_empty());

        let event: ClerkWebhookEvent =
            serde_json::from_str(r#"{"type": "user.created"}"#).expect("missing data defaults");
        assert_eq!(event.event_type, USER_CREATED_EVENT);
        assert!(event.data.id.is_empty());
    }
}
