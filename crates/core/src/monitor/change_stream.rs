//! In-process change feed over the watched collections.
//!
//! Mutating services publish every successful write here; the change
//! monitor subscribes and translates the notifications into webhook
//! dispatches. Publishing is fast and non-blocking, and a publish with no
//! subscribers is a no-op.

use tokio::sync::broadcast;

use crate::clients::clients_model::Client;
use crate::proposals::proposals_model::Proposal;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// How a record changed. Removals are not carried on the feed; there is
/// no deletion notification kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
}

#[derive(Clone, Debug)]
pub struct ClientChange {
    pub kind: ChangeKind,
    pub client: Client,
}

#[derive(Clone, Debug)]
pub struct ProposalChange {
    pub kind: ChangeKind,
    pub proposal: Proposal,
}

/// Fan-out hub with one broadcast channel per watched collection.
pub struct ChangeBroadcaster {
    clients_tx: broadcast::Sender<ClientChange>,
    proposals_tx: broadcast::Sender<ProposalChange>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        let (clients_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (proposals_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        ChangeBroadcaster {
            clients_tx,
            proposals_tx,
        }
    }

    pub fn publish_client(&self, kind: ChangeKind, client: Client) {
        let _ = self.clients_tx.send(ClientChange { kind, client });
    }

    pub fn publish_proposal(&self, kind: ChangeKind, proposal: Proposal) {
        let _ = self.proposals_tx.send(ProposalChange { kind, proposal });
    }

    pub fn subscribe_clients(&self) -> broadcast::Receiver<ClientChange> {
        self.clients_tx.subscribe()
    }

    pub fn subscribe_proposals(&self) -> broadcast::Receiver<ProposalChange> {
        self.proposals_tx.subscribe()
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
