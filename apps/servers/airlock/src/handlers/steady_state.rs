use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, error};

use fleet_lock::Manager;

use crate::error::AirlockError;
use crate::handlers::identity::validate_identity;
use crate::metrics;
use crate::AppState;

/// Endpoint for releasing a semaphore lock.
pub const STEADY_STATE_ENDPOINT: &str = "/v1/steady-state";

/// Handler for the `/v1/steady-state` endpoint.
pub async fn steady_state(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<StatusCode, AirlockError> {
	debug!("got steady-state report");
	metrics::STEADY_STATE_REQUESTS.inc();

	let identity = validate_identity(&headers, &body).map_err(|err| {
		error!("failed to validate client identity: {err}");
		err
	})?;
	debug!(group = %identity.group, id = %identity.id, "processing client steady-state report");

	let settings = &state.settings;
	let slots = settings.group_slots(&identity.group).ok_or_else(|| {
		error!("unable to satisfy client request: unknown group {:?}", identity.group);
		AirlockError::UnknownGroup(identity.group.clone())
	})?;

	let mut manager = Manager::open(&settings.etcd_endpoints, settings.etcd_client_tls.as_ref(), settings.etcd_txn_timeout, &identity.group, slots)
		.await
		.map_err(|err| {
			error!("failed to initialize semaphore manager: {err}");
			AirlockError::SemaphoreInit(err)
		})?;

	let semaphore = manager.unlock_if_held(&identity.id).await.map_err(|err| {
		error!("failed to release any semaphore lock: {err}");
		AirlockError::Lock(err)
	})?;

	metrics::publish_database_gauges(&identity.group, &semaphore);

	debug!(group = %identity.group, id = %identity.id, "steady-state confirmed");
	Ok(StatusCode::OK)
}
