use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fleet_lock::Manager;

use crate::config::Settings;
use crate::metrics;

/// Pause between two reconciliation sweeps.
const RECONCILE_PAUSE: Duration = Duration::from_secs(60);

/// Background loop polling each group's semaphore.
///
/// Publishes the per-group database gauges and warns when the stored
/// state diverges from configuration or violates the capacity invariant.
/// Observed divergence is never corrected here. Failures are logged and
/// the sweep moves on to the next group.
pub async fn run(settings: Arc<Settings>, shutdown: CancellationToken) {
	loop {
		for (group, &slots) in &settings.lock_groups {
			if shutdown.is_cancelled() {
				return;
			}
			reconcile_group(&settings, group, slots).await;
		}

		tokio::select! {
			() = shutdown.cancelled() => return,
			() = sleep(RECONCILE_PAUSE) => {}
		}
	}
}

async fn reconcile_group(settings: &Settings, group: &str, slots: u64) {
	debug!(group, "reconciling semaphore state");

	let mut manager = match Manager::open(&settings.etcd_endpoints, settings.etcd_client_tls.as_ref(), settings.etcd_txn_timeout, group, slots).await {
		Ok(manager) => manager,
		Err(err) => {
			warn!(group, "failed to initialize semaphore manager: {err}");
			return;
		}
	};

	let semaphore = match manager.fetch_semaphore().await {
		Ok(semaphore) => semaphore,
		Err(err) => {
			warn!(group, "failed to fetch semaphore: {err}");
			return;
		}
	};

	metrics::publish_database_gauges(group, &semaphore);

	if semaphore.total_slots != slots {
		warn!(group, configured = slots, stored = semaphore.total_slots, "configured and stored slot counts disagree");
	}
	if semaphore.total_slots < semaphore.holders.len() as u64 {
		warn!(group, slots = semaphore.total_slots, holders = semaphore.holders.len(), "semaphore has more holders than slots");
	}
}
