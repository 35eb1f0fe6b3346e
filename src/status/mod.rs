pub mod badge;
pub mod dialog;
pub mod listeners;
pub mod monitor;
pub mod poll;
pub mod process;

pub use badge::StatusBadge;
pub use dialog::{DialogOptions, PublishDialog, PublishPolicy, PublishTarget};
pub use listeners::{ListenerSet, StatusListener};
pub use monitor::{ReplicationStatus, StatusOptions};
pub use poll::{PollPolicy, PollScheduler, PolledMonitor};
pub use process::ProcessSubStatus;
