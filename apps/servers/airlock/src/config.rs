use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use fleet_lock::TlsMaterial;

const DEFAULT_SERVICE_ADDRESS: &str = "0.0.0.0";
const DEFAULT_SERVICE_PORT: u16 = 9090;
const DEFAULT_STATUS_PORT: u16 = 9091;
const DEFAULT_TXN_TIMEOUT_MS: u64 = 3000;
const DEFAULT_GROUP_NAME: &str = "default";
const DEFAULT_SLOTS: u64 = 1;

/// Runtime application settings, after merging TOML fragments over
/// defaults. Immutable once parsed.
#[derive(Clone, Debug)]
pub struct Settings {
	pub service: ServerSettings,
	/// Status (metrics) server; enabled by the presence of the `[status]`
	/// section.
	pub status: Option<ServerSettings>,

	pub etcd_endpoints: Vec<String>,
	pub etcd_txn_timeout: Duration,
	pub etcd_client_tls: Option<TlsMaterial>,

	/// Group name -> slot count.
	pub lock_groups: BTreeMap<String, u64>,
}

/// Bind settings for one of the HTTP servers.
#[derive(Clone, Debug)]
pub struct ServerSettings {
	pub address: String,
	pub port: u16,
	pub tls: bool,
}

// Top-level TOML configuration fragment. All sections are optional.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
	service: Option<ServerSection>,
	status: Option<ServerSection>,
	etcd3: Option<Etcd3Section>,
	lock: Option<LockSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
	address: Option<String>,
	port: Option<u16>,
	tls: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Etcd3Section {
	endpoints: Option<Vec<String>>,
	transaction_timeout_ms: Option<u64>,
	client_cert_pub_path: Option<String>,
	client_cert_key_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LockSection {
	default_group_name: Option<String>,
	default_slots: Option<u64>,
	#[serde(default)]
	groups: Vec<LockGroupSection>,
}

#[derive(Debug, Deserialize)]
struct LockGroupSection {
	name: String,
	slots: Option<u64>,
}

impl Settings {
	/// Parses the TOML configuration file at `path` into validated
	/// runtime settings.
	pub fn parse(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read configuration file {}", path.display()))?;
		Self::parse_toml(&raw)
	}

	/// Parses and validates a TOML configuration fragment.
	pub fn parse_toml(raw: &str) -> Result<Self> {
		let fragment: TomlConfig = toml::from_str(raw).context("failed to parse TOML configuration")?;
		let settings = Self::merge(fragment)?;
		settings.validate()?;

		Ok(settings)
	}

	/// Returns the configured slot count for `group`, if any.
	#[must_use]
	pub fn group_slots(&self, group: &str) -> Option<u64> {
		self.lock_groups.get(group).copied()
	}

	fn merge(fragment: TomlConfig) -> Result<Self> {
		let service = fragment.service.unwrap_or_default();
		let etcd3 = fragment.etcd3.unwrap_or_default();
		let lock = fragment.lock.unwrap_or_default();

		let default_group = lock.default_group_name.unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string());
		let default_slots = lock.default_slots.unwrap_or(DEFAULT_SLOTS);
		let mut lock_groups = BTreeMap::new();
		for group in lock.groups {
			lock_groups.insert(group.name, group.slots.unwrap_or(default_slots));
		}
		// The default group always exists, even when not listed.
		lock_groups.entry(default_group).or_insert(default_slots);

		let etcd_client_tls = match (etcd3.client_cert_pub_path, etcd3.client_cert_key_path) {
			(Some(cert_path), Some(key_path)) => Some(TlsMaterial { cert_path, key_path }),
			(None, None) => None,
			_ => bail!("client_cert_pub_path and client_cert_key_path must be set together"),
		};

		Ok(Self {
			service: ServerSettings {
				address: service.address.unwrap_or_else(|| DEFAULT_SERVICE_ADDRESS.to_string()),
				port: service.port.unwrap_or(DEFAULT_SERVICE_PORT),
				tls: service.tls.unwrap_or(true),
			},
			status: fragment.status.map(|status| ServerSettings {
				address: status.address.unwrap_or_else(|| DEFAULT_SERVICE_ADDRESS.to_string()),
				port: status.port.unwrap_or(DEFAULT_STATUS_PORT),
				tls: status.tls.unwrap_or(true),
			}),
			etcd_endpoints: etcd3.endpoints.unwrap_or_default(),
			etcd_txn_timeout: Duration::from_millis(etcd3.transaction_timeout_ms.unwrap_or(DEFAULT_TXN_TIMEOUT_MS)),
			etcd_client_tls,
			lock_groups,
		})
	}

	fn validate(&self) -> Result<()> {
		if self.etcd_endpoints.is_empty() {
			bail!("no etcd3 endpoints configured");
		}
		if self.lock_groups.is_empty() {
			bail!("no lock groups configured");
		}
		if self.lock_groups.keys().any(String::is_empty) {
			bail!("empty lock group name");
		}
		if let Some((name, _)) = self.lock_groups.iter().find(|(_, &slots)| slots == 0) {
			bail!("lock group {name:?} configured with zero slots");
		}

		Ok(())
	}
}
