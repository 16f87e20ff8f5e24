use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of outbound event kinds.
///
/// Serializes to the wire identifiers carried in the `event` field of the
/// delivery envelope (`client_created`, `proposal_status_changed`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    ClientCreated,
    ClientUpdated,
    ClientStatusChanged,
    ProposalCreated,
    ProposalUpdated,
    ProposalStatusChanged,
    PipelineStatusChanged,
}

impl WebhookEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventKind::ClientCreated => "client_created",
            WebhookEventKind::ClientUpdated => "client_updated",
            WebhookEventKind::ClientStatusChanged => "client_status_changed",
            WebhookEventKind::ProposalCreated => "proposal_created",
            WebhookEventKind::ProposalUpdated => "proposal_updated",
            WebhookEventKind::ProposalStatusChanged => "proposal_status_changed",
            WebhookEventKind::PipelineStatusChanged => "pipeline_status_changed",
        }
    }
}

impl fmt::Display for WebhookEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-entity event toggles on a destination.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityEventFlags {
    pub created: bool,
    pub updated: bool,
    pub status_changed: bool,
}

/// Pipeline-board event toggles on a destination.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineEventFlags {
    pub status_changed: bool,
}

/// The full nested flag set of a destination.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEventFlags {
    pub clients: EntityEventFlags,
    pub proposals: EntityEventFlags,
    pub pipeline: PipelineEventFlags,
}

impl WebhookEventFlags {
    /// Whether the destination opted in to the given event kind.
    pub fn allows(&self, kind: WebhookEventKind) -> bool {
        match kind {
            WebhookEventKind::ClientCreated => self.clients.created,
            WebhookEventKind::ClientUpdated => self.clients.updated,
            WebhookEventKind::ClientStatusChanged => self.clients.status_changed,
            WebhookEventKind::ProposalCreated => self.proposals.created,
            WebhookEventKind::ProposalUpdated => self.proposals.updated,
            WebhookEventKind::ProposalStatusChanged => self.proposals.status_changed,
            WebhookEventKind::PipelineStatusChanged => self.pipeline.status_changed,
        }
    }

    /// Flag set with every event enabled.
    pub fn all() -> Self {
        WebhookEventFlags {
            clients: EntityEventFlags {
                created: true,
                updated: true,
                status_changed: true,
            },
            proposals: EntityEventFlags {
                created: true,
                updated: true,
                status_changed: true,
            },
            pipeline: PipelineEventFlags {
                status_changed: true,
            },
        }
    }
}

/// Per-destination repeat-notification suppression settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThrottleSettings {
    pub enabled: bool,
    /// Minimum number of seconds between deliveries of the same
    /// (event kind, entity) pair to this destination.
    pub interval: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        ThrottleSettings {
            enabled: false,
            interval: 60,
        }
    }
}

/// A configured external HTTP endpoint receiving webhook notifications.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDestination {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Shared secret forwarded verbatim in a request header so the
    /// receiver can authenticate the call.
    pub secret: String,
    pub enabled: bool,
    pub events: WebhookEventFlags,
    pub throttle: ThrottleSettings,
}

impl WebhookDestination {
    /// A destination receives an event only when it is enabled, has a
    /// delivery URL, and opted in to the specific event kind.
    pub fn is_eligible(&self, kind: WebhookEventKind) -> bool {
        self.enabled && !self.url.is_empty() && self.events.allows(kind)
    }
}

/// Payload for registering a destination through the admin screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebhookDestination {
    pub name: String,
    pub url: String,
    pub secret: String,
    pub enabled: bool,
    #[serde(default)]
    pub events: WebhookEventFlags,
    #[serde(default)]
    pub throttle: ThrottleSettings,
}

/// Partial update for a destination. `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDestinationUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
    pub enabled: Option<bool>,
    pub events: Option<WebhookEventFlags>,
    pub throttle: Option<ThrottleSettings>,
}

/// The single-destination configuration document of earlier releases,
/// stored at a well-known settings key. Upgraded at read time when the
/// destination collection is empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyWebhookConfig {
    pub url: String,
    pub secret: String,
    pub enabled: bool,
    pub events: WebhookEventFlags,
    pub throttle: ThrottleSettings,
}

impl LegacyWebhookConfig {
    /// Upgrades the bare legacy document into the destination shape,
    /// preserving every original field.
    pub fn into_destination(self) -> WebhookDestination {
        WebhookDestination {
            id: "legacy".to_string(),
            name: "Legacy webhook".to_string(),
            url: self.url,
            secret: self.secret,
            enabled: self.enabled,
            events: self.events,
            throttle: self.throttle,
        }
    }
}

/// The JSON body POSTed to each destination.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: WebhookEventKind,
    /// Dispatch time, RFC 3339.
    pub timestamp: String,
    pub data: Value,
}

/// Composite key identifying one throttle window.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub destination_id: String,
    pub kind: WebhookEventKind,
    pub entity_id: String,
}

/// Actor attribution carried on pipeline-stage change notifications.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventActor {
    pub id: String,
    pub name: String,
    pub role: String,
}

/// Payload of a `pipeline_status_changed` notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineChangeEvent {
    pub proposal_id: String,
    pub proposal_number: String,
    pub client_name: Option<String>,
    pub previous_status: String,
    pub new_status: String,
    /// RFC 3339.
    pub changed_at: String,
    pub changed_by: EventActor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_identifiers() {
        assert_eq!(WebhookEventKind::ClientCreated.as_str(), "client_created");
        assert_eq!(
            WebhookEventKind::PipelineStatusChanged.as_str(),
            "pipeline_status_changed"
        );

        let json = serde_json::to_string(&WebhookEventKind::ProposalStatusChanged).unwrap();
        assert_eq!(json, "\"proposal_status_changed\"");
    }

    #[test]
    fn test_flags_allow_exactly_the_matching_kind() {
        let flags = WebhookEventFlags {
            clients: EntityEventFlags {
                created: true,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(flags.allows(WebhookEventKind::ClientCreated));
        assert!(!flags.allows(WebhookEventKind::ClientUpdated));
        assert!(!flags.allows(WebhookEventKind::ProposalCreated));
        assert!(!flags.allows(WebhookEventKind::PipelineStatusChanged));
    }

    #[test]
    fn test_eligibility_requires_enabled_url_and_flag() {
        let mut destination = WebhookDestination {
            id: "d1".to_string(),
            name: "CRM".to_string(),
            url: "https://crm.example/hooks".to_string(),
            secret: "s3cret".to_string(),
            enabled: true,
            events: WebhookEventFlags::all(),
            throttle: ThrottleSettings::default(),
        };
        assert!(destination.is_eligible(WebhookEventKind::ClientCreated));

        destination.enabled = false;
        assert!(!destination.is_eligible(WebhookEventKind::ClientCreated));

        destination.enabled = true;
        destination.url.clear();
        assert!(!destination.is_eligible(WebhookEventKind::ClientCreated));

        destination.url = "https://crm.example/hooks".to_string();
        destination.events.clients.created = false;
        assert!(!destination.is_eligible(WebhookEventKind::ClientCreated));
        assert!(destination.is_eligible(WebhookEventKind::ClientUpdated));
    }

    #[test]
    fn test_flags_parse_nested_camel_case_document() {
        let flags: WebhookEventFlags = serde_json::from_str(
            r#"{"clients":{"created":true,"statusChanged":true},"pipeline":{"statusChanged":true}}"#,
        )
        .unwrap();

        assert!(flags.allows(WebhookEventKind::ClientCreated));
        assert!(flags.allows(WebhookEventKind::ClientStatusChanged));
        assert!(flags.allows(WebhookEventKind::PipelineStatusChanged));
        assert!(!flags.allows(WebhookEventKind::ClientUpdated));
        assert!(!flags.allows(WebhookEventKind::ProposalCreated));
    }

    #[test]
    fn test_legacy_config_upgrade_preserves_fields() {
        let legacy: LegacyWebhookConfig = serde_json::from_str(
            r#"{
                "url": "https://old.example/hook",
                "secret": "legacy-secret",
                "enabled": true,
                "events": {"proposals": {"created": true}},
                "throttle": {"enabled": true, "interval": 120}
            }"#,
        )
        .unwrap();

        let destination = legacy.into_destination();
        assert_eq!(destination.id, "legacy");
        assert_eq!(destination.name, "Legacy webhook");
        assert_eq!(destination.url, "https://old.example/hook");
        assert_eq!(destination.secret, "legacy-secret");
        assert!(destination.enabled);
        assert!(destination.events.proposals.created);
        assert!(destination.throttle.enabled);
        assert_eq!(destination.throttle.interval, 120);
    }
}
