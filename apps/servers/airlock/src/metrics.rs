use axum::http::StatusCode;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_gauge, register_int_gauge_vec, Encoder, IntCounter, IntGauge, IntGaugeVec, TextEncoder};

use fleet_lock::Semaphore;

/// Endpoint for Prometheus metrics on the status server.
pub const METRICS_ENDPOINT: &str = "/metrics";

lazy_static! {
	pub static ref PRE_REBOOT_REQUESTS: IntCounter =
		register_int_counter!("v1_pre_reboot_incoming_requests_total", "Total number of incoming requests to the pre-reboot endpoint.").expect("Failed to register PRE_REBOOT_REQUESTS");
	pub static ref STEADY_STATE_REQUESTS: IntCounter =
		register_int_counter!("v1_steady_state_incoming_requests_total", "Total number of incoming requests to the steady-state endpoint.").expect("Failed to register STEADY_STATE_REQUESTS");
	pub static ref CONFIG_GROUPS: IntGauge = register_int_gauge!("config_groups", "Total number of configured lock groups.").expect("Failed to register CONFIG_GROUPS");
	pub static ref CONFIG_SLOTS: IntGaugeVec =
		register_int_gauge_vec!("config_semaphore_slots", "Total number of configured slots per group.", &["group"]).expect("Failed to register CONFIG_SLOTS");
	pub static ref DATABASE_LOCK_HOLDERS: IntGaugeVec =
		register_int_gauge_vec!("database_semaphore_lock_holders", "Total number of locked slots per group, in the database.", &["group"]).expect("Failed to register DATABASE_LOCK_HOLDERS");
	pub static ref DATABASE_SLOTS: IntGaugeVec =
		register_int_gauge_vec!("database_semaphore_slots", "Total number of slots per group, in the database.", &["group"]).expect("Failed to register DATABASE_SLOTS");
}

/// Updates the per-group database gauges from an observed semaphore.
pub fn publish_database_gauges(group: &str, semaphore: &Semaphore) {
	DATABASE_LOCK_HOLDERS.with_label_values(&[group]).set(semaphore.holders.len() as i64);
	DATABASE_SLOTS.with_label_values(&[group]).set(semaphore.total_slots as i64);
}

/// Prometheus metrics handler.
pub async fn metrics_handler() -> Result<String, StatusCode> {
	let encoder = TextEncoder::new();
	let metric_families = prometheus::gather();
	let mut buffer = Vec::new();

	if encoder.encode(&metric_families, &mut buffer).is_err() {
		return Err(StatusCode::INTERNAL_SERVER_ERROR);
	}

	String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_publish_database_gauges() {
		let semaphore = Semaphore {
			total_slots: 3,
			holders: vec!["x".to_string(), "y".to_string(), "z".to_string()],
		};
		publish_database_gauges("drifted", &semaphore);

		assert_eq!(DATABASE_LOCK_HOLDERS.with_label_values(&["drifted"]).get(), 3);
		assert_eq!(DATABASE_SLOTS.with_label_values(&["drifted"]).get(), 3);
	}

	#[tokio::test]
	async fn test_exposition_contains_catalog() {
		PRE_REBOOT_REQUESTS.inc();
		STEADY_STATE_REQUESTS.inc();
		CONFIG_GROUPS.set(1);
		CONFIG_SLOTS.with_label_values(&["default"]).set(1);

		let exposition = metrics_handler().await.unwrap();
		for name in [
			"v1_pre_reboot_incoming_requests_total",
			"v1_steady_state_incoming_requests_total",
			"config_groups",
			"config_semaphore_slots",
		] {
			assert!(exposition.contains(name), "missing metric {name}");
		}
	}
}
