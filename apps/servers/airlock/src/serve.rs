use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::Settings;
use crate::metrics;
use crate::reconciler;
use crate::routes;
use crate::AppState;

/// Runs the HTTP services and the reconciler until shutdown.
pub async fn run(settings: Settings) -> Result<()> {
	if settings.service.tls {
		bail!("TLS service is not currently supported, set `tls = false` under `[service]`");
	}
	if settings.status.as_ref().is_some_and(|status| status.tls) {
		bail!("TLS status service is not currently supported, set `tls = false` under `[status]`");
	}

	debug!(groups = ?settings.lock_groups, "lock groups");

	metrics::CONFIG_GROUPS.set(settings.lock_groups.len() as i64);
	for (group, &slots) in &settings.lock_groups {
		metrics::CONFIG_SLOTS.with_label_values(&[group]).set(slots as i64);
	}

	let settings = Arc::new(settings);
	let shutdown = CancellationToken::new();

	let reconciler_handle = tokio::spawn(reconciler::run(settings.clone(), shutdown.clone()));

	let mut status_handle = None;
	if let Some(status) = &settings.status {
		let status_addr = format!("{}:{}", status.address, status.port);
		let listener = TcpListener::bind(&status_addr).await.with_context(|| format!("failed to bind status address {status_addr}"))?;
		info!(address = %status.address, port = status.port, "starting status service");

		let token = shutdown.clone();
		status_handle = Some(tokio::spawn(async move {
			axum::serve(listener, routes::status_routes())
				.with_graceful_shutdown(async move { token.cancelled().await })
				.await
		}));
	}

	let app = routes::service_routes().with_state(AppState { settings: settings.clone() }).layer(TraceLayer::new_for_http());

	let service_addr = format!("{}:{}", settings.service.address, settings.service.port);
	let listener = TcpListener::bind(&service_addr).await.with_context(|| format!("failed to bind service address {service_addr}"))?;
	info!(address = %settings.service.address, port = settings.service.port, "starting service");

	let signal_token = shutdown.clone();
	tokio::spawn(async move {
		let _ = tokio::signal::ctrl_c().await;
		info!("received shutdown signal");
		signal_token.cancel();
	});

	let token = shutdown.clone();
	axum::serve(listener, app)
		.with_graceful_shutdown(async move { token.cancelled().await })
		.await
		.context("service terminated")?;

	// The main server only returns once the token fired; reap the rest.
	shutdown.cancel();
	if let Some(handle) = status_handle {
		let _ = handle.await;
	}
	let _ = reconciler_handle.await;

	info!("shutdown complete");
	Ok(())
}
