pub mod change_stream;
pub mod monitor_model;
pub mod monitor_service;


pub use change_stream::{ChangeBroadcaster, ChangeKind, ClientChange, ProposalChange};
pub use monitor_model::{MonitorSession, Role};
pub use monitor_service::{ChangeMonitor, MonitorHandle};
