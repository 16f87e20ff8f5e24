//! Tests for the webhook dispatcher contract.
//!
//! These cover the delivery rules the rest of the application relies on:
//! eligibility filtering, per-destination throttling, configuration
//! caching with single-flight refresh, legacy-configuration upgrade, and
//! fan-out failure isolation.

#[cfg(test)]
mod tests {
    use crate::errors::{Error, Result};
    use crate::webhooks::webhooks_model::{
        EntityEventFlags, EventActor, LegacyWebhookConfig, NewWebhookDestination,
        PipelineChangeEvent, PipelineEventFlags, ThrottleSettings, WebhookDestination,
        WebhookDestinationUpdate, WebhookEventFlags, WebhookEventKind,
    };
    use crate::webhooks::webhooks_service::WebhookDispatcher;
    use crate::webhooks::webhooks_traits::{
        WebhookConfigRepositoryTrait, WebhookDispatcherTrait, WebhookTransport,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // =========================================================================
    // Mock configuration repository
    // =========================================================================

    #[derive(Default)]
    struct MockConfigRepo {
        destinations: Mutex<Vec<WebhookDestination>>,
        legacy: Mutex<Option<LegacyWebhookConfig>>,
        fetch_count: AtomicUsize,
        fail_reads: AtomicBool,
        fetch_delay: Mutex<Option<Duration>>,
    }

    impl MockConfigRepo {
        fn with_destinations(destinations: Vec<WebhookDestination>) -> Self {
            MockConfigRepo {
                destinations: Mutex::new(destinations),
                ..Default::default()
            }
        }

        fn set_destinations(&self, destinations: Vec<WebhookDestination>) {
            *self.destinations.lock().unwrap() = destinations;
        }

        fn set_legacy(&self, legacy: LegacyWebhookConfig) {
            *self.legacy.lock().unwrap() = Some(legacy);
        }

        fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn set_fetch_delay(&self, delay: Duration) {
            *self.fetch_delay.lock().unwrap() = Some(delay);
        }

        fn fetches(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebhookConfigRepositoryTrait for MockConfigRepo {
        async fn list_destinations(&self) -> Result<Vec<WebhookDestination>> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            let delay = *self.fetch_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Error::Unexpected("intentional config failure".into()));
            }
            Ok(self.destinations.lock().unwrap().clone())
        }

        async fn get_legacy_config(&self) -> Result<Option<LegacyWebhookConfig>> {
            Ok(self.legacy.lock().unwrap().clone())
        }

        async fn create_destination(
            &self,
            _new_destination: NewWebhookDestination,
        ) -> Result<WebhookDestination> {
            unimplemented!()
        }

        async fn update_destination(
            &self,
            _destination_id: &str,
            _update: WebhookDestinationUpdate,
        ) -> Result<WebhookDestination> {
            unimplemented!()
        }

        async fn delete_destination(&self, _destination_id: &str) -> Result<usize> {
            unimplemented!()
        }
    }

    // =========================================================================
    // Mock transport
    // =========================================================================

    #[derive(Clone, Debug)]
    struct Delivery {
        url: String,
        secret: String,
        body: Value,
    }

    #[derive(Default)]
    struct MockTransport {
        deliveries: Mutex<Vec<Delivery>>,
        fail_urls: Mutex<HashSet<String>>,
    }

    impl MockTransport {
        fn fail_url(&self, url: &str) {
            self.fail_urls.lock().unwrap().insert(url.to_string());
        }

        fn deliveries(&self) -> Vec<Delivery> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for MockTransport {
        async fn deliver(&self, url: &str, secret: &str, body: &Value) -> Result<()> {
            self.deliveries.lock().unwrap().push(Delivery {
                url: url.to_string(),
                secret: secret.to_string(),
                body: body.clone(),
            });
            if self.fail_urls.lock().unwrap().contains(url) {
                return Err(Error::Unexpected(format!("{} unreachable", url)));
            }
            Ok(())
        }
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn destination(id: &str, url: &str) -> WebhookDestination {
        WebhookDestination {
            id: id.to_string(),
            name: format!("destination {}", id),
            url: url.to_string(),
            secret: format!("secret-{}", id),
            enabled: true,
            events: WebhookEventFlags::all(),
            throttle: ThrottleSettings::default(),
        }
    }

    fn setup(
        destinations: Vec<WebhookDestination>,
    ) -> (Arc<MockConfigRepo>, Arc<MockTransport>, WebhookDispatcher) {
        let repo = Arc::new(MockConfigRepo::with_destinations(destinations));
        let transport = Arc::new(MockTransport::default());
        let dispatcher = WebhookDispatcher::new(repo.clone(), transport.clone());
        (repo, transport, dispatcher)
    }

    // =========================================================================
    // Eligibility and envelope
    // =========================================================================

    #[tokio::test]
    async fn test_send_client_created_delivers_envelope() {
        let mut only_created = destination("a", "https://x.example/hook");
        only_created.events = WebhookEventFlags {
            clients: EntityEventFlags {
                created: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let (_repo, transport, dispatcher) = setup(vec![only_created]);

        let delivered = dispatcher
            .send_client_created(json!({"id": "c1", "name": "Acme"}))
            .await;

        assert!(delivered);
        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].url, "https://x.example/hook");
        assert_eq!(deliveries[0].secret, "secret-a");
        assert_eq!(deliveries[0].body["event"], "client_created");
        assert_eq!(deliveries[0].body["data"]["id"], "c1");
        assert_eq!(deliveries[0].body["data"]["name"], "Acme");

        let timestamp = deliveries[0].body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_ineligible_destinations_are_skipped() {
        let mut disabled = destination("a", "https://a.example");
        disabled.enabled = false;

        let no_url = destination("b", "");

        let mut flag_off = destination("c", "https://c.example");
        flag_off.events.clients.created = false;

        let (_repo, transport, dispatcher) = setup(vec![disabled, no_url, flag_off]);

        let delivered = dispatcher
            .send_client_created(json!({"id": "c1"}))
            .await;

        assert!(!delivered);
        assert!(transport.deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_only_eligible_destination_receives() {
        let eligible = destination("a", "https://a.example");
        let mut not_for_proposals = destination("b", "https://b.example");
        not_for_proposals.events.proposals.created = false;

        let (_repo, transport, dispatcher) = setup(vec![eligible, not_for_proposals]);

        let delivered = dispatcher
            .send_proposal_created(json!({"id": "p1", "proposalNumber": "P-2025-0001"}))
            .await;

        assert!(delivered);
        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].url, "https://a.example");
        assert_eq!(deliveries[0].body["event"], "proposal_created");
    }

    #[tokio::test]
    async fn test_no_destinations_returns_false_without_io() {
        let (repo, transport, dispatcher) = setup(Vec::new());

        let delivered = dispatcher
            .send(WebhookEventKind::ClientUpdated, json!({"id": "c1"}), "c1")
            .await;

        assert!(!delivered);
        assert!(transport.deliveries().is_empty());
        assert_eq!(repo.fetches(), 1);
    }

    // =========================================================================
    // Fan-out isolation
    // =========================================================================

    #[tokio::test]
    async fn test_failure_is_isolated_per_destination() {
        let (_repo, transport, dispatcher) =
            setup(vec![destination("a", "https://a.example"), destination("b", "https://b.example")]);
        transport.fail_url("https://a.example");

        let delivered = dispatcher
            .send_client_updated(json!({"id": "c1"}))
            .await;

        // Both destinations were attempted; one success is enough.
        assert!(delivered);
        let urls: Vec<String> = transport.deliveries().iter().map(|d| d.url.clone()).collect();
        assert!(urls.contains(&"https://a.example".to_string()));
        assert!(urls.contains(&"https://b.example".to_string()));
    }

    #[tokio::test]
    async fn test_all_failures_return_false() {
        let (_repo, transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);
        transport.fail_url("https://a.example");

        let delivered = dispatcher
            .send_client_updated(json!({"id": "c1"}))
            .await;

        assert!(!delivered);
        assert_eq!(transport.deliveries().len(), 1);
    }

    // =========================================================================
    // Throttling
    // =========================================================================

    #[tokio::test]
    async fn test_throttle_suppresses_repeat_within_interval() {
        let mut throttled = destination("a", "https://a.example");
        throttled.throttle = ThrottleSettings {
            enabled: true,
            interval: 60,
        };
        let (_repo, transport, dispatcher) = setup(vec![throttled]);

        assert!(dispatcher.send_client_updated(json!({"id": "c1"})).await);
        assert!(!dispatcher.send_client_updated(json!({"id": "c1"})).await);

        assert_eq!(transport.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn test_throttle_is_scoped_per_entity() {
        let mut throttled = destination("a", "https://a.example");
        throttled.throttle = ThrottleSettings {
            enabled: true,
            interval: 60,
        };
        let (_repo, transport, dispatcher) = setup(vec![throttled]);

        assert!(dispatcher.send_client_updated(json!({"id": "c1"})).await);
        assert!(dispatcher.send_client_updated(json!({"id": "c2"})).await);

        assert_eq!(transport.deliveries().len(), 2);
    }

    // =========================================================================
    // Configuration cache
    // =========================================================================

    #[tokio::test]
    async fn test_config_cache_serves_repeat_sends() {
        let (repo, _transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);

        dispatcher.send_client_updated(json!({"id": "c1"})).await;
        dispatcher.send_client_updated(json!({"id": "c2"})).await;

        assert_eq!(repo.fetches(), 1);
    }

    #[tokio::test]
    async fn test_cache_invalidation_forces_refetch() {
        let (repo, transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);

        dispatcher.send_client_updated(json!({"id": "c1"})).await;
        repo.set_destinations(vec![destination("a", "https://moved.example")]);
        dispatcher.invalidate_config_cache();
        dispatcher.send_client_updated(json!({"id": "c2"})).await;

        assert_eq!(repo.fetches(), 2);
        assert_eq!(transport.deliveries()[1].url, "https://moved.example");
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let repo = Arc::new(MockConfigRepo::with_destinations(vec![destination(
            "a",
            "https://a.example",
        )]));
        let transport = Arc::new(MockTransport::default());
        let dispatcher = WebhookDispatcher::new(repo.clone(), transport.clone())
            .with_cache_ttl(Duration::ZERO);

        dispatcher.send_client_updated(json!({"id": "c1"})).await;
        dispatcher.send_client_updated(json!({"id": "c2"})).await;

        assert_eq!(repo.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_sends_share_one_fetch() {
        let (repo, transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);
        repo.set_fetch_delay(Duration::from_millis(50));
        let dispatcher = Arc::new(dispatcher);

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.send_client_updated(json!({"id": "c1"})).await })
        };
        let second = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.send_client_updated(json!({"id": "c2"})).await })
        };

        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
        assert_eq!(repo.fetches(), 1);
        assert_eq!(transport.deliveries().len(), 2);
    }

    #[tokio::test]
    async fn test_config_failure_degrades_and_is_not_cached() {
        let (repo, transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);
        repo.set_fail_reads(true);

        assert!(!dispatcher.send_client_updated(json!({"id": "c1"})).await);
        assert!(transport.deliveries().is_empty());

        repo.set_fail_reads(false);
        assert!(dispatcher.send_client_updated(json!({"id": "c1"})).await);
        assert_eq!(repo.fetches(), 2);
    }

    // =========================================================================
    // Legacy configuration upgrade
    // =========================================================================

    #[tokio::test]
    async fn test_legacy_config_is_upgraded_when_collection_empty() {
        let (repo, transport, dispatcher) = setup(Vec::new());
        repo.set_legacy(LegacyWebhookConfig {
            url: "https://old.example/hook".to_string(),
            secret: "legacy-secret".to_string(),
            enabled: true,
            events: WebhookEventFlags::all(),
            throttle: ThrottleSettings::default(),
        });

        let delivered = dispatcher.send_client_created(json!({"id": "c1"})).await;

        assert!(delivered);
        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].url, "https://old.example/hook");
        assert_eq!(deliveries[0].secret, "legacy-secret");
    }

    #[tokio::test]
    async fn test_legacy_config_ignored_when_destinations_exist() {
        let (repo, transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);
        repo.set_legacy(LegacyWebhookConfig {
            url: "https://old.example/hook".to_string(),
            enabled: true,
            events: WebhookEventFlags::all(),
            ..Default::default()
        });

        assert!(dispatcher.send_client_created(json!({"id": "c1"})).await);

        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].url, "https://a.example");
    }

    // =========================================================================
    // Status-change payload merging
    // =========================================================================

    #[tokio::test]
    async fn test_status_changed_merges_previous_and_new_status() {
        let (_repo, transport, dispatcher) = setup(vec![destination("a", "https://a.example")]);

        let delivered = dispatcher
            .send_client_status_changed(json!({"id": "c1", "status": "approved"}), "pending")
            .await;

        assert!(delivered);
        let body = &transport.deliveries()[0].body;
        assert_eq!(body["event"], "client_status_changed");
        assert_eq!(body["data"]["previousStatus"], "pending");
        assert_eq!(body["data"]["newStatus"], "approved");
        assert_eq!(body["data"]["status"], "approved");
    }

    #[tokio::test]
    async fn test_pipeline_change_payload_shape() {
        let mut pipeline_only = destination("a", "https://a.example");
        pipeline_only.events = WebhookEventFlags {
            pipeline: PipelineEventFlags {
                status_changed: true,
            },
            ..Default::default()
        };
        let (_repo, transport, dispatcher) = setup(vec![pipeline_only]);

        let delivered = dispatcher
            .send_pipeline_status_changed(PipelineChangeEvent {
                proposal_id: "p1".to_string(),
                proposal_number: "P-2025-0001".to_string(),
                client_name: Some("Acme".to_string()),
                previous_status: "submitted".to_string(),
                new_status: "credit".to_string(),
                changed_at: chrono::Utc::now().to_rfc3339(),
                changed_by: EventActor {
                    id: "u1".to_string(),
                    name: "Morgan".to_string(),
                    role: "manager".to_string(),
                },
            })
            .await;

        assert!(delivered);
        let body = &transport.deliveries()[0].body;
        assert_eq!(body["event"], "pipeline_status_changed");
        assert_eq!(body["data"]["proposalId"], "p1");
        assert_eq!(body["data"]["proposalNumber"], "P-2025-0001");
        assert_eq!(body["data"]["clientName"], "Acme");
        assert_eq!(body["data"]["previousStatus"], "submitted");
        assert_eq!(body["data"]["newStatus"], "credit");
        assert_eq!(body["data"]["changedBy"]["role"], "manager");
    }
}
