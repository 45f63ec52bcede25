use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, error};

use fleet_lock::Manager;

use crate::error::AirlockError;
use crate::handlers::identity::validate_identity;
use crate::metrics;
use crate::AppState;

/// Endpoint for requesting a semaphore lock.
pub const PRE_REBOOT_ENDPOINT: &str = "/v1/pre-reboot";

/// Handler for the `/v1/pre-reboot` endpoint.
pub async fn pre_reboot(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<StatusCode, AirlockError> {
	debug!("got pre-reboot request");
	metrics::PRE_REBOOT_REQUESTS.inc();

	let identity = validate_identity(&headers, &body).map_err(|err| {
		error!("failed to validate client identity: {err}");
		err
	})?;
	debug!(group = %identity.group, id = %identity.id, "processing client pre-reboot request");

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

	manager.recursive_lock(&identity.id).await.map_err(|err| {
		error!("failed to acquire semaphore lock: {err}");
		AirlockError::Lock(err)
	})?;

	debug!(group = %identity.group, id = %identity.id, "giving green-flag to pre-reboot request");
	Ok(StatusCode::OK)
}
