use axum::http::HeaderMap;
use serde::Deserialize;

use crate::error::AirlockError;

/// Header that every fleet-lock request must carry, with value `true`.
pub const PROTOCOL_HEADER: &str = "fleet-lock-protocol";

// Envelope for a remote lock request.
#[derive(Debug, Deserialize)]
struct RemoteParams {
	client_params: ClientParams,
}

// Client parameters for a remote lock request.
#[derive(Debug, Deserialize)]
struct ClientParams {
	id: String,
	group: String,
}

/// Validated client identity from request parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeIdentity {
	pub id: String,
	pub group: String,
}

/// Validates a client request envelope, returning its identity.
///
/// The protocol header must equal the exact string `true` and the body
/// must carry non-empty `id` and `group` fields; unknown body fields are
/// ignored. Configuration is not consulted here.
pub fn validate_identity(headers: &HeaderMap, body: &[u8]) -> Result<NodeIdentity, AirlockError> {
	let header = headers.get(PROTOCOL_HEADER).and_then(|value| value.to_str().ok());
	if header != Some("true") {
		return Err(AirlockError::InvalidIdentity(format!("wrong '{PROTOCOL_HEADER}' header")));
	}

	let input: RemoteParams = serde_json::from_slice(body).map_err(|err| AirlockError::InvalidIdentity(err.to_string()))?;

	if input.client_params.group.is_empty() {
		return Err(AirlockError::InvalidIdentity("empty group".to_string()));
	}
	if input.client_params.id.is_empty() {
		return Err(AirlockError::InvalidIdentity("empty client id".to_string()));
	}

	Ok(NodeIdentity {
		id: input.client_params.id,
		group: input.client_params.group,
	})
}
