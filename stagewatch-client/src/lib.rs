//! HTTP transport and configuration for `stagewatch` monitors.

pub mod client;
pub mod config;

pub use client::HttpReplicationClient;
pub use config::{ClientConfig, PollConfig};
