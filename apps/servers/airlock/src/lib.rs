pub mod cli;
pub mod config;
pub mod error;
pub mod get_slots;
pub mod handlers;
pub mod metrics;
pub mod reconciler;
pub mod routes;
pub mod serve;

use std::sync::Arc;

use crate::config::Settings;

/// Shared state for the HTTP service. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
	pub settings: Arc<Settings>,
}
