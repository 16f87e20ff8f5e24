use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::errors::Result;
use crate::webhooks::webhooks_model::{
    PipelineChangeEvent, ThrottleKey, WebhookDestination, WebhookEnvelope, WebhookEventKind,
};
use crate::webhooks::webhooks_traits::{
    WebhookConfigRepositoryTrait, WebhookDispatcherTrait, WebhookTransport,
};

/// How long a fetched destination list stays valid.
const CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);

struct CachedDestinations {
    fetched_at: Instant,
    destinations: Vec<WebhookDestination>,
}

/// Delivers signed notification payloads to the configured destinations.
///
/// The dispatcher is a best-effort side channel: configuration-read
/// failures degrade to "no destinations", per-destination delivery
/// failures are isolated, and nothing escapes the public operations as an
/// error. Callers learn via the boolean return whether at least one
/// destination acknowledged the delivery.
pub struct WebhookDispatcher {
    config_repo: Arc<dyn WebhookConfigRepositoryTrait>,
    transport: Arc<dyn WebhookTransport>,
    cache: RwLock<Option<CachedDestinations>>,
    refresh_lock: tokio::sync::Mutex<()>,
    throttle: Mutex<HashMap<ThrottleKey, Instant>>,
    cache_ttl: Duration,
}

impl WebhookDispatcher {
    pub fn new(
        config_repo: Arc<dyn WebhookConfigRepositoryTrait>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        WebhookDispatcher {
            config_repo,
            transport,
            cache: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
            throttle: Mutex::new(HashMap::new()),
            cache_ttl: CONFIG_CACHE_TTL,
        }
    }

    /// Overrides the configuration cache TTL.
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    async fn dispatch(&self, kind: WebhookEventKind, payload: Value, entity_id: &str) -> bool {
        let destinations = self.destinations().await;
        let eligible: Vec<WebhookDestination> = destinations
            .into_iter()
            .filter(|destination| destination.is_eligible(kind))
            .collect();
        if eligible.is_empty() {
            debug!("No destinations eligible for '{}' events", kind);
            return false;
        }

        let envelope = WebhookEnvelope {
            event: kind,
            timestamp: Utc::now().to_rfc3339(),
            data: payload,
        };
        let body = match serde_json::to_value(&envelope) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize '{}' webhook envelope: {}", kind, e);
                return false;
            }
        };

        // The throttle stamp moves at decision time, before any await, so
        // two dispatches for the same key cannot both pass the check.
        let attempts: Vec<WebhookDestination> = eligible
            .into_iter()
            .filter(|destination| self.throttle_allows(destination, kind, entity_id))
            .collect();
        if attempts.is_empty() {
            return false;
        }

        let deliveries = attempts
            .iter()
            .map(|destination| self.deliver_to(destination, kind, entity_id, &body));
        let outcomes = futures::future::join_all(deliveries).await;
        outcomes.into_iter().any(|delivered| delivered)
    }

    async fn deliver_to(
        &self,
        destination: &WebhookDestination,
        kind: WebhookEventKind,
        entity_id: &str,
        body: &Value,
    ) -> bool {
        match self
            .transport
            .deliver(&destination.url, &destination.secret, body)
            .await
        {
            Ok(()) => {
                info!(
                    "Delivered '{}' webhook for '{}' to '{}'",
                    kind, entity_id, destination.name
                );
                true
            }
            Err(e) => {
                error!(
                    "Webhook delivery of '{}' for '{}' to '{}' failed: {}",
                    kind, entity_id, destination.name, e
                );
                false
            }
        }
    }

    /// Returns the destination list, served from the cache while it is
    /// fresh. Concurrent callers during a refresh share one underlying
    /// fetch: they line up on the refresh lock and re-check the cache the
    /// refresher just filled.
    async fn destinations(&self) -> Vec<WebhookDestination> {
        if let Some(destinations) = self.cached_destinations() {
            return destinations;
        }

        let _refresh = self.refresh_lock.lock().await;
        if let Some(destinations) = self.cached_destinations() {
            return destinations;
        }

        match self.fetch_destinations().await {
            Ok(destinations) => {
                let mut cache = self.lock_cache_write();
                *cache = Some(CachedDestinations {
                    fetched_at: Instant::now(),
                    destinations: destinations.clone(),
                });
                destinations
            }
            Err(e) => {
                // A failed read degrades to "no destinations"; the next
                // dispatch retries instead of caching the outage.
                error!("Failed to load webhook destinations: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_destinations(&self) -> Result<Vec<WebhookDestination>> {
        let destinations = self.config_repo.list_destinations().await?;
        if !destinations.is_empty() {
            return Ok(destinations);
        }

        match self.config_repo.get_legacy_config().await? {
            Some(legacy) => {
                debug!("Destination collection empty, upgrading legacy webhook configuration");
                Ok(vec![legacy.into_destination()])
            }
            None => Ok(Vec::new()),
        }
    }

    /// Checks the throttle window for the composite key and, when the
    /// attempt may proceed, records it. Suppressed attempts leave the
    /// stamp untouched, so the window is anchored at the last attempt
    /// that went through.
    fn throttle_allows(
        &self,
        destination: &WebhookDestination,
        kind: WebhookEventKind,
        entity_id: &str,
    ) -> bool {
        let key = ThrottleKey {
            destination_id: destination.id.clone(),
            kind,
            entity_id: entity_id.to_string(),
        };

        let mut stamps = self.lock_throttle();
        if destination.throttle.enabled {
            if let Some(last_attempt) = stamps.get(&key) {
                if last_attempt.elapsed() < Duration::from_secs(destination.throttle.interval) {
                    info!(
                        "Throttled '{}' webhook for '{}' to '{}'",
                        kind, entity_id, destination.name
                    );
                    return false;
                }
            }
        }

        stamps.insert(key, Instant::now());
        true
    }

    fn cached_destinations(&self) -> Option<Vec<WebhookDestination>> {
        let cache = self.cache.read().unwrap_or_else(|poisoned| {
            warn!("Webhook config cache lock was poisoned, recovering");
            poisoned.into_inner()
        });
        cache
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.cache_ttl)
            .map(|cached| cached.destinations.clone())
    }

    fn lock_cache_write(&self) -> RwLockWriteGuard<'_, Option<CachedDestinations>> {
        self.cache.write().unwrap_or_else(|poisoned| {
            warn!("Webhook config cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_throttle(&self) -> MutexGuard<'_, HashMap<ThrottleKey, Instant>> {
        self.throttle.lock().unwrap_or_else(|poisoned| {
            warn!("Webhook throttle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl WebhookDispatcherTrait for WebhookDispatcher {
    async fn send(&self, kind: WebhookEventKind, payload: Value, entity_id: &str) -> bool {
        self.dispatch(kind, payload, entity_id).await
    }

    async fn send_client_created(&self, client: Value) -> bool {
        let entity_id = entity_id_of(&client);
        self.dispatch(WebhookEventKind::ClientCreated, client, &entity_id)
            .await
    }

    async fn send_client_updated(&self, client: Value) -> bool {
        let entity_id = entity_id_of(&client);
        self.dispatch(WebhookEventKind::ClientUpdated, client, &entity_id)
            .await
    }

    async fn send_client_status_changed(&self, client: Value, previous_status: &str) -> bool {
        let entity_id = entity_id_of(&client);
        let payload = with_status_transition(client, previous_status);
        self.dispatch(WebhookEventKind::ClientStatusChanged, payload, &entity_id)
            .await
    }

    async fn send_proposal_created(&self, proposal: Value) -> bool {
        let entity_id = entity_id_of(&proposal);
        self.dispatch(WebhookEventKind::ProposalCreated, proposal, &entity_id)
            .await
    }

    async fn send_proposal_updated(&self, proposal: Value) -> bool {
        let entity_id = entity_id_of(&proposal);
        self.dispatch(WebhookEventKind::ProposalUpdated, proposal, &entity_id)
            .await
    }

    async fn send_proposal_status_changed(&self, proposal: Value, previous_status: &str) -> bool {
        let entity_id = entity_id_of(&proposal);
        let payload = with_status_transition(proposal, previous_status);
        self.dispatch(WebhookEventKind::ProposalStatusChanged, payload, &entity_id)
            .await
    }

    async fn send_pipeline_status_changed(&self, change: PipelineChangeEvent) -> bool {
        let entity_id = change.proposal_id.clone();
        match serde_json::to_value(&change) {
            Ok(payload) => {
                self.dispatch(WebhookEventKind::PipelineStatusChanged, payload, &entity_id)
                    .await
            }
            Err(e) => {
                error!("Failed to serialize pipeline change payload: {}", e);
                false
            }
        }
    }

    fn invalidate_config_cache(&self) {
        *self.lock_cache_write() = None;
    }
}

/// The record's own id, used for throttling and logging.
fn entity_id_of(payload: &Value) -> String {
    payload
        .get("id")
        .and_then(|id| id.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Merges `previousStatus`/`newStatus` into a record payload for the
/// status-changed event variants.
fn with_status_transition(mut payload: Value, previous_status: &str) -> Value {
    if let Value::Object(record) = &mut payload {
        let new_status = record.get("status").cloned().unwrap_or(Value::Null);
        record.insert(
            "previousStatus".to_string(),
            Value::String(previous_status.to_string()),
        );
        record.insert("newStatus".to_string(), new_status);
    }
    payload
}
