//! # stagewatch
//!
//! Client-side monitoring of content replication: follows a release as it
//! is replicated to a stage, keeps status panels, badges and the publish
//! dialog in step with the server, and issues publish/abort commands.
//!
//! The crate renders nothing itself. Hosts implement the traits in [`view`]
//! for their UI and an [`api::ReplicationApi`] transport (the companion
//! `stagewatch-client` crate ships a reqwest one).
//!
//! ## Monitors
//!
//! | Type | Polls | Purpose |
//! |------|-------|---------|
//! | [`StatusBadge`] | summary | compact state badge |
//! | [`ReplicationStatus`] | full status | panel with per-process rows, drives dialogs |
//! | [`PublishDialog`] | no | publish/abort commands, follows its status via a listener |
//!
//! Polling is adaptive ([`PollPolicy`]) and stops once a stage reaches
//! `synchron`. Each monitor has at most one pending timer.
//!
//! ```rust,no_run
//! use stagewatch::{PollPolicy, ReplicationStatus, StatusOptions};
//! # use std::sync::Arc;
//! # fn attach(
//! #     api: Arc<dyn stagewatch::api::ReplicationApi>,
//! #     panel: Arc<dyn stagewatch::view::StatusPanel>,
//! # ) -> stagewatch::Result<()> {
//! let status = ReplicationStatus::new(
//!     api,
//!     panel,
//!     Arc::new(stagewatch::view::KeyLabels),
//!     StatusOptions {
//!         poll: PollPolicy::default(),
//!         ..Default::default()
//!     },
//! )?;
//! println!("{} is {}", status.identity().stage, status.state().state);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod codec;
pub mod error;
pub mod registry;
pub mod status;
pub mod types;
pub mod view;

pub use api::{Endpoints, ReplicationApi};
pub use error::{Result, StageWatchError};
pub use registry::WidgetRegistry;
pub use status::{
    DialogOptions, ListenerSet, PollPolicy, PollScheduler, PolledMonitor, ProcessSubStatus,
    PublishDialog, PublishPolicy, PublishTarget, ReplicationStatus, StatusBadge, StatusListener,
    StatusOptions,
};
pub use types::*;
