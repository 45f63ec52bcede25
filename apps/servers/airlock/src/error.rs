use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fleet_lock::LockError;

/// Body shape of every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
	/// Machine-friendly error description.
	pub kind: String,
	/// Human-friendly error description.
	pub value: String,
}

/// Error type used by the main HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum AirlockError {
	#[error("{0}")]
	InvalidIdentity(String),

	#[error("unknown group {0:?}")]
	UnknownGroup(String),

	#[error("failed to initialize semaphore manager: {0}")]
	SemaphoreInit(#[source] LockError),

	#[error("{0}")]
	Lock(#[source] LockError),

	#[error("nil Airlock server")]
	NilServer,

	#[error("{0}")]
	Generic(String),
}

impl AirlockError {
	/// Machine-friendly error code, as exposed on the wire.
	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::InvalidIdentity(_) => "invalid_client_identity",
			Self::UnknownGroup(_) => "unknown_group",
			Self::SemaphoreInit(_) => "failed_sem_init",
			Self::Lock(_) => "failed_lock",
			Self::NilServer => "nil_server",
			Self::Generic(_) => "generic_error",
		}
	}

	const fn status_code(&self) -> StatusCode {
		match self {
			Self::InvalidIdentity(_) | Self::UnknownGroup(_) => StatusCode::BAD_REQUEST,
			Self::SemaphoreInit(_) | Self::Lock(_) | Self::NilServer | Self::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AirlockError {
	fn into_response(self) -> Response {
		let mut value = self.to_string();
		if value.is_empty() {
			value = "generic error".to_string();
		}

		let body = ErrorBody {
			kind: self.kind().to_string(),
			value,
		};
		(self.status_code(), Json(body)).into_response()
	}
}
