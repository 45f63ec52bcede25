use anyhow::{Context, Result};

use fleet_lock::{Manager, Semaphore};

use crate::config::Settings;

/// Performs live introspection of groups/slots.
pub async fn run(settings: &Settings) -> Result<()> {
	for (group, &slots) in &settings.lock_groups {
		let mut manager = Manager::open(&settings.etcd_endpoints, settings.etcd_client_tls.as_ref(), settings.etcd_txn_timeout, group, slots)
			.await
			.with_context(|| format!("failed to initialize semaphore manager for group {group:?}"))?;
		let semaphore = manager.fetch_semaphore().await.with_context(|| format!("failed to fetch semaphore for group {group:?}"))?;

		print!("{}", human_short(group, &semaphore));
	}

	Ok(())
}

/// Renders groups/slots details in a short, human-friendly way. Holders
/// are listed in the order returned by the store.
fn human_short(group: &str, semaphore: &Semaphore) -> String {
	let mut out = String::new();

	out.push_str(&format!("group: {group}\n"));
	out.push_str(&format!(" semaphore slots: {}\n", semaphore.total_slots));
	out.push_str(" lock owners:\n");
	for owner in &semaphore.holders {
		out.push_str(&format!(" - {owner}\n"));
	}
	out.push_str("\n---\n");

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_human_short() {
		let semaphore = Semaphore {
			total_slots: 3,
			holders: vec!["a".to_string(), "b".to_string(), "c".to_string()],
		};

		let out = human_short("workers", &semaphore);
		assert_eq!(out, "group: workers\n semaphore slots: 3\n lock owners:\n - a\n - b\n - c\n\n---\n");
	}

	#[test]
	fn test_human_short_no_holders() {
		let out = human_short("default", &Semaphore::new(1));
		assert_eq!(out, "group: default\n semaphore slots: 1\n lock owners:\n\n---\n");
	}
}
