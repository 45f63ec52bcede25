use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{pre_reboot, steady_state};
use crate::metrics;
use crate::AppState;

/// Routes served on the main service port.
pub fn service_routes() -> Router<AppState> {
	Router::new()
		.route(pre_reboot::PRE_REBOOT_ENDPOINT, post(pre_reboot::pre_reboot))
		.route(steady_state::STEADY_STATE_ENDPOINT, post(steady_state::steady_state))
}

/// Routes served on the status port.
pub fn status_routes() -> Router {
	Router::new().route(metrics::METRICS_ENDPOINT, get(metrics::metrics_handler))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;
	use std::sync::Arc;
	use std::time::Duration;

	use axum::body::Body;
	use axum::http::{Method, Request, StatusCode};
	use tower::ServiceExt;

	use crate::config::{ServerSettings, Settings};
	use crate::handlers::identity::PROTOCOL_HEADER;
	use crate::AppState;

	fn test_state() -> AppState {
		let settings = Settings {
			service: ServerSettings {
				address: "127.0.0.1".to_string(),
				port: 9090,
				tls: false,
			},
			status: None,
			// Nothing listens here; requests must fail before any dial.
			etcd_endpoints: vec!["http://127.0.0.1:1".to_string()],
			etcd_txn_timeout: Duration::from_millis(100),
			etcd_client_tls: None,
			lock_groups: BTreeMap::from([("workers".to_string(), 2)]),
		};

		AppState { settings: Arc::new(settings) }
	}

	fn app() -> Router {
		service_routes().with_state(test_state())
	}

	async fn error_kind(response: axum::response::Response) -> (StatusCode, String) {
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
		(status, body["kind"].as_str().unwrap().to_string())
	}

	#[tokio::test]
	async fn test_missing_protocol_header() {
		for endpoint in ["/v1/pre-reboot", "/v1/steady-state"] {
			let request = Request::builder()
				.method(Method::POST)
				.uri(endpoint)
				.body(Body::from(r#"{"client_params": {"id": "node-a", "group": "workers"}}"#))
				.unwrap();
			let response = app().oneshot(request).await.unwrap();

			let (status, kind) = error_kind(response).await;
			assert_eq!(status, StatusCode::BAD_REQUEST);
			assert_eq!(kind, "invalid_client_identity");
		}
	}

	#[tokio::test]
	async fn test_malformed_body() {
		let request = Request::builder()
			.method(Method::POST)
			.uri("/v1/pre-reboot")
			.header(PROTOCOL_HEADER, "true")
			.body(Body::from("{"))
			.unwrap();
		let response = app().oneshot(request).await.unwrap();

		let (status, kind) = error_kind(response).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(kind, "invalid_client_identity");
	}

	#[tokio::test]
	async fn test_unknown_group() {
		let request = Request::builder()
			.method(Method::POST)
			.uri("/v1/pre-reboot")
			.header(PROTOCOL_HEADER, "true")
			.body(Body::from(r#"{"client_params": {"id": "node-a", "group": "missing"}}"#))
			.unwrap();
		let response = app().oneshot(request).await.unwrap();

		let (status, kind) = error_kind(response).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(kind, "unknown_group");
	}

	#[tokio::test]
	async fn test_unreachable_backend_is_sem_init_failure() {
		let request = Request::builder()
			.method(Method::POST)
			.uri("/v1/steady-state")
			.header(PROTOCOL_HEADER, "true")
			.body(Body::from(r#"{"client_params": {"id": "node-a", "group": "workers"}}"#))
			.unwrap();
		let response = app().oneshot(request).await.unwrap();

		let (status, kind) = error_kind(response).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(kind, "failed_sem_init");
	}

	#[tokio::test]
	async fn test_metrics_route() {
		let request = Request::builder().method(Method::GET).uri("/metrics").body(Body::empty()).unwrap();
		let response = status_routes().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
	}
}
