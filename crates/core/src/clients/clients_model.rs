use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered client of the lending business.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// National document number, digits only. Masked before leaving the
    /// application through the webhook channel.
    pub document: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Returns a copy safe for outbound notification payloads: every digit
    /// of the document number except the last two is masked.
    pub fn redacted(&self) -> Client {
        Client {
            document: self.document.as_deref().map(mask_document),
            ..self.clone()
        }
    }
}

/// Payload for registering a new client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an existing client. `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub status: Option<String>,
}

/// Masks every digit except the last two, leaving non-digit separators
/// (dots, dashes) in place.
pub fn mask_document(document: &str) -> String {
    let digit_count = document.chars().filter(|c| c.is_ascii_digit()).count();
    let mut digits_seen = 0;
    document
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                digits_seen += 1;
                if digit_count - digits_seen < 2 {
                    c
                } else {
                    '*'
                }
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_document_keeps_last_two_digits() {
        assert_eq!(mask_document("12345678901"), "*********01");
        assert_eq!(mask_document("123.456.789-01"), "***.***.***-01");
    }

    #[test]
    fn test_mask_document_short_values() {
        assert_eq!(mask_document("7"), "7");
        assert_eq!(mask_document("42"), "42");
        assert_eq!(mask_document(""), "");
    }

    #[test]
    fn test_redacted_masks_document_only() {
        let client = Client {
            id: "c1".to_string(),
            name: "Acme".to_string(),
            email: Some("ops@acme.test".to_string()),
            phone: None,
            document: Some("12345678901".to_string()),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let redacted = client.redacted();
        assert_eq!(redacted.document.as_deref(), Some("*********01"));
        assert_eq!(redacted.name, client.name);
        assert_eq!(redacted.email, client.email);
    }
}
