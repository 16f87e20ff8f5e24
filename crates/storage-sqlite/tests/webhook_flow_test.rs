//! End-to-end flow: a service mutation lands in SQLite, the change
//! monitor picks it up off the broadcaster, and the dispatcher delivers
//! the webhook through the transport seam.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::Value;
use tempfile::TempDir;

use creditflow_core::banks::{BankRepositoryTrait, NewBank};
use creditflow_core::clients::ClientService;
use creditflow_core::monitor::{ChangeBroadcaster, ChangeMonitor, MonitorSession, Role};
use creditflow_core::proposals::ProposalService;
use creditflow_core::webhooks::{
    NewWebhookDestination, ThrottleSettings, WebhookConfigRepositoryTrait, WebhookDispatcher,
    WebhookEventFlags, WebhookTransport,
};
use creditflow_core::Result;
use creditflow_storage_sqlite::banks::BankRepository;
use creditflow_storage_sqlite::clients::ClientRepository;
use creditflow_storage_sqlite::proposals::ProposalRepository;
use creditflow_storage_sqlite::webhooks::WebhookConfigRepository;
use creditflow_storage_sqlite::init;

#[derive(Default)]
struct RecordingTransport {
    bodies: Mutex<Vec<Value>>,
}

impl RecordingTransport {
    fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn deliver(&self, _url: &str, _secret: &str, body: &Value) -> Result<()> {
        self.bodies.lock().unwrap().push(body.clone());
        Ok(())
    }
}

async fn wait_for_bodies(transport: &RecordingTransport, count: usize) -> Vec<Value> {
    for _ in 0..200 {
        let bodies = transport.bodies();
        if bodies.len() >= count {
            return bodies;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    transport.bodies()
}

#[tokio::test]
async fn test_mutation_flows_to_webhook_delivery() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("creditflow.db");
    let (pool, writer) = init(db_path.to_str().unwrap()).unwrap();

    let client_repo = Arc::new(ClientRepository::new(pool.clone(), writer.clone()));
    let proposal_repo = Arc::new(ProposalRepository::new(pool.clone(), writer.clone()));
    let bank_repo = Arc::new(BankRepository::new(pool.clone(), writer.clone()));
    let config_repo = Arc::new(WebhookConfigRepository::new(pool.clone(), writer.clone()));

    config_repo
        .create_destination(NewWebhookDestination {
            name: "CRM".to_string(),
            url: "https://crm.example/hooks".to_string(),
            secret: "s3cret".to_string(),
            enabled: true,
            events: WebhookEventFlags::all(),
            throttle: ThrottleSettings::default(),
        })
        .await
        .unwrap();

    let bank = bank_repo
        .create_bank(NewBank {
            id: None,
            name: "Banco Alfa".to_string(),
            trading_name: Some("Alfa".to_string()),
        })
        .await
        .unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Arc::new(WebhookDispatcher::new(
        config_repo.clone(),
        transport.clone(),
    ));

    let broadcaster = Arc::new(ChangeBroadcaster::new());
    let monitor = ChangeMonitor::new(
        dispatcher.clone(),
        client_repo.clone(),
        bank_repo.clone(),
        MonitorSession {
            user_id: "u1".to_string(),
            user_name: "Morgan".to_string(),
            role: Role::Manager,
        },
    );
    let handle = monitor.start(&broadcaster).unwrap();

    let client_service =
        ClientService::new(client_repo.clone()).with_change_broadcaster(broadcaster.clone());
    let proposal_service = ProposalService::new(proposal_repo.clone(), client_repo.clone())
        .with_change_broadcaster(broadcaster.clone());

    // Registration produces a client_created delivery with the document
    // masked.
    let client = client_service
        .register_client(
            "Acme".to_string(),
            Some("ops@acme.test".to_string()),
            None,
            Some("12345678901".to_string()),
        )
        .await
        .unwrap();

    let bodies = wait_for_bodies(&transport, 1).await;
    assert_eq!(bodies[0]["event"], "client_created");
    assert_eq!(bodies[0]["data"]["id"], client.id.as_str());
    assert_eq!(bodies[0]["data"]["document"], "*********01");

    // Proposal intake produces an enriched proposal_created delivery.
    let proposal = proposal_service
        .submit_proposal(client.id.clone(), Some(bank.id.clone()), dec!(25000), 24)
        .await
        .unwrap();
    assert_eq!(proposal.proposal_number.matches('-').count(), 2);

    let bodies = wait_for_bodies(&transport, 2).await;
    assert_eq!(bodies[1]["event"], "proposal_created");
    assert_eq!(bodies[1]["data"]["clientName"], "Acme");
    assert_eq!(bodies[1]["data"]["bankName"], "Banco Alfa");

    // A pipeline move produces pipeline_status_changed plus
    // proposal_updated, and no proposal_status_changed.
    proposal_service
        .move_pipeline_stage(&proposal.id, "credit")
        .await
        .unwrap();

    let bodies = wait_for_bodies(&transport, 4).await;
    assert_eq!(bodies.len(), 4);
    assert_eq!(bodies[2]["event"], "pipeline_status_changed");
    assert_eq!(bodies[2]["data"]["previousStatus"], "submitted");
    assert_eq!(bodies[2]["data"]["newStatus"], "credit");
    assert_eq!(bodies[2]["data"]["changedBy"]["role"], "manager");
    assert_eq!(bodies[3]["event"], "proposal_updated");
    assert_eq!(bodies[3]["data"]["pipelineStatus"], "credit");

    handle.stop();
}
