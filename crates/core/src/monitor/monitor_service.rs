use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, warn};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::banks::banks_traits::BankRepositoryTrait;
use crate::clients::clients_model::Client;
use crate::clients::clients_traits::ClientRepositoryTrait;
use crate::errors::{Error, Result};
use crate::monitor::change_stream::{
    ChangeBroadcaster, ChangeKind, ClientChange, ProposalChange,
};
use crate::monitor::monitor_model::MonitorSession;
use crate::proposals::proposals_model::Proposal;
use crate::webhooks::webhooks_model::PipelineChangeEvent;
use crate::webhooks::webhooks_traits::WebhookDispatcherTrait;

/// Watches the client and proposal collections and translates storage
/// mutations into semantic webhook dispatches.
///
/// One snapshot map per collection holds the last-seen state of every
/// observed record; diffing a notification against the snapshot decides
/// whether it is a creation, a plain update, a status transition, or a
/// pipeline-stage move. Snapshots live for the monitor's lifetime and are
/// reset by starting a fresh monitor.
pub struct ChangeMonitor {
    dispatcher: Arc<dyn WebhookDispatcherTrait>,
    client_repo: Arc<dyn ClientRepositoryTrait>,
    bank_repo: Arc<dyn BankRepositoryTrait>,
    session: MonitorSession,
}

/// Detaches the monitor's subscriptions when the owning context goes away
/// (logout, shutdown).
pub struct MonitorHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|task| task.is_finished())
    }
}

impl ChangeMonitor {
    pub fn new(
        dispatcher: Arc<dyn WebhookDispatcherTrait>,
        client_repo: Arc<dyn ClientRepositoryTrait>,
        bank_repo: Arc<dyn BankRepositoryTrait>,
        session: MonitorSession,
    ) -> Self {
        ChangeMonitor {
            dispatcher,
            client_repo,
            bank_repo,
            session,
        }
    }

    /// Subscribes to both watched collections and spawns the watch loops.
    /// Fails when the session's role is not allowed to observe other
    /// users' records.
    pub fn start(self, broadcaster: &ChangeBroadcaster) -> Result<MonitorHandle> {
        if !self.session.role.can_monitor() {
            return Err(Error::Unauthorized(format!(
                "role '{}' may not run the change monitor",
                self.session.role.as_str()
            )));
        }

        let clients_rx = broadcaster.subscribe_clients();
        let proposals_rx = broadcaster.subscribe_proposals();

        let monitor = Arc::new(self);
        let clients_task = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.watch_clients(clients_rx).await })
        };
        let proposals_task = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.watch_proposals(proposals_rx).await })
        };

        Ok(MonitorHandle {
            tasks: vec![clients_task, proposals_task],
        })
    }

    async fn watch_clients(&self, mut rx: broadcast::Receiver<ClientChange>) {
        let mut snapshots: HashMap<String, Client> = HashMap::new();
        loop {
            match rx.recv().await {
                Ok(change) => self.handle_client_change(&mut snapshots, change).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Client change feed lagged, {} notifications dropped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("Client change feed closed, monitor detaching");
                    break;
                }
            }
        }
    }

    async fn watch_proposals(&self, mut rx: broadcast::Receiver<ProposalChange>) {
        let mut snapshots: HashMap<String, Proposal> = HashMap::new();
        loop {
            match rx.recv().await {
                Ok(change) => self.handle_proposal_change(&mut snapshots, change).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        "Proposal change feed lagged, {} notifications dropped",
                        missed
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("Proposal change feed closed, monitor detaching");
                    break;
                }
            }
        }
    }

    async fn handle_client_change(
        &self,
        snapshots: &mut HashMap<String, Client>,
        change: ClientChange,
    ) {
        let ClientChange { kind, client } = change;
        let payload = match serde_json::to_value(client.redacted()) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize client '{}': {}", client.id, e);
                return;
            }
        };

        match kind {
            ChangeKind::Added => {
                snapshots.insert(client.id.clone(), client);
                self.dispatcher.send_client_created(payload).await;
            }
            ChangeKind::Modified => {
                let previous = snapshots.get(&client.id);
                match previous {
                    Some(previous) if previous.status != client.status => {
                        self.dispatcher
                            .send_client_status_changed(payload.clone(), &previous.status)
                            .await;
                    }
                    Some(_) => {}
                    None => {
                        debug!(
                            "No snapshot for client '{}', skipping status diff",
                            client.id
                        );
                    }
                }
                self.dispatcher.send_client_updated(payload).await;
                snapshots.insert(client.id.clone(), client);
            }
        }
    }

    async fn handle_proposal_change(
        &self,
        snapshots: &mut HashMap<String, Proposal>,
        change: ProposalChange,
    ) {
        let ProposalChange { kind, proposal } = change;
        let (payload, client_name) = match self.enrich_proposal(&proposal) {
            Some(enriched) => enriched,
            None => return,
        };

        match kind {
            ChangeKind::Added => {
                snapshots.insert(proposal.id.clone(), proposal);
                self.dispatcher.send_proposal_created(payload).await;
            }
            ChangeKind::Modified => {
                match snapshots.get(&proposal.id) {
                    Some(previous) => {
                        if previous.status != proposal.status {
                            self.dispatcher
                                .send_proposal_status_changed(payload.clone(), &previous.status)
                                .await;
                        }
                        if previous.pipeline_status != proposal.pipeline_status {
                            let change = PipelineChangeEvent {
                                proposal_id: proposal.id.clone(),
                                proposal_number: proposal.proposal_number.clone(),
                                client_name,
                                previous_status: previous.pipeline_status.clone(),
                                new_status: proposal.pipeline_status.clone(),
                                changed_at: Utc::now().to_rfc3339(),
                                changed_by: self.session.actor(),
                            };
                            self.dispatcher.send_pipeline_status_changed(change).await;
                        }
                    }
                    None => {
                        debug!(
                            "No snapshot for proposal '{}', skipping status diffs",
                            proposal.id
                        );
                    }
                }
                self.dispatcher.send_proposal_updated(payload).await;
                snapshots.insert(proposal.id.clone(), proposal);
            }
        }
    }

    /// Adds the denormalized display fields downstream receivers expect:
    /// the client's name and the bank's names. A failed lookup is logged
    /// and leaves the field absent; it never blocks the notification.
    fn enrich_proposal(&self, proposal: &Proposal) -> Option<(Value, Option<String>)> {
        let mut payload = match serde_json::to_value(proposal) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize proposal '{}': {}", proposal.id, e);
                return None;
            }
        };
        let record = payload.as_object_mut()?;

        let mut client_name = None;
        match self.client_repo.get_client_by_id(&proposal.client_id) {
            Ok(Some(client)) => {
                record.insert("clientName".to_string(), Value::String(client.name.clone()));
                client_name = Some(client.name);
            }
            Ok(None) => {
                debug!(
                    "Client '{}' not found while enriching proposal '{}'",
                    proposal.client_id, proposal.id
                );
            }
            Err(e) => {
                warn!(
                    "Client lookup failed while enriching proposal '{}': {}",
                    proposal.id, e
                );
            }
        }

        if let Some(bank_id) = &proposal.bank_id {
            match self.bank_repo.get_bank_by_id(bank_id) {
                Ok(Some(bank)) => {
                    record.insert("bankName".to_string(), Value::String(bank.name));
                    if let Some(trading_name) = bank.trading_name {
                        record.insert(
                            "bankTradingName".to_string(),
                            Value::String(trading_name),
                        );
                    }
                }
                Ok(None) => {
                    debug!(
                        "Bank '{}' not found while enriching proposal '{}'",
                        bank_id, proposal.id
                    );
                }
                Err(e) => {
                    warn!(
                        "Bank lookup failed while enriching proposal '{}': {}",
                        proposal.id, e
                    );
                }
            }
        }

        Some((payload, client_name))
    }
}
