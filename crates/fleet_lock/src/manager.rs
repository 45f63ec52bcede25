use std::fs;
use std::time::Duration;

use etcd_client::{Client, Compare, CompareOp, ConnectOptions, Identity, TlsOptions, Txn, TxnOp};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::LockError;
use crate::semaphore::{Acquisition, Semaphore};

// URL-unreserved characters are kept as-is, everything else is escaped.
const GROUP_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Client certificate and key for mutual TLS towards etcd3.
#[derive(Clone, Debug)]
pub struct TlsMaterial {
	pub cert_path: String,
	pub key_path: String,
}

impl TlsMaterial {
	fn load(&self) -> Result<TlsOptions, LockError> {
		let cert = fs::read(&self.cert_path).map_err(|source| LockError::TlsMaterial {
			path: self.cert_path.clone(),
			source,
		})?;
		let key = fs::read(&self.key_path).map_err(|source| LockError::TlsMaterial {
			path: self.key_path.clone(),
			source,
		})?;

		Ok(TlsOptions::new().identity(Identity::from_pem(cert, key)))
	}
}

/// Lock manager for one reboot group.
///
/// Owns a short-lived etcd3 client scoped to the group's semaphore key;
/// all mutations go through version-conditioned transactions. Dropping
/// the manager releases the client.
pub struct Manager {
	client: Client,
	key_path: String,
}

/// Computes the storage key for a group's semaphore.
fn key_path(group: &str) -> String {
	format!("com.coreos.airlock/groups/{}/v1/semaphore", utf8_percent_encode(group, GROUP_ESCAPE))
}

impl Manager {
	/// Connects to etcd3 and ensures the group's semaphore is initialized.
	///
	/// Both connecting and every subsequent request are bounded by
	/// `timeout`. The initialization transaction only writes when the key
	/// does not exist yet; an existing record is never overwritten.
	pub async fn open(endpoints: &[String], tls: Option<&TlsMaterial>, timeout: Duration, group: &str, slots: u64) -> Result<Self, LockError> {
		let mut options = ConnectOptions::new().with_connect_timeout(timeout).with_timeout(timeout);
		if let Some(material) = tls {
			options = options.with_tls(material.load()?);
		}

		let client = Client::connect(endpoints, Some(options)).await?;
		let mut manager = Self {
			client,
			key_path: key_path(group),
		};
		manager.ensure_init(slots).await?;

		Ok(manager)
	}

	/// Adds `id` as a holder of the semaphore.
	///
	/// Short-circuits without writing when the id already holds a slot.
	/// A concurrent writer surfaces as `LockError::Conflict`, a full
	/// semaphore as `LockError::Full`.
	pub async fn recursive_lock(&mut self, id: &str) -> Result<Acquisition, LockError> {
		let (mut semaphore, version) = self.get().await?;

		match semaphore.recursive_lock(id)? {
			Acquisition::AlreadyHeld => Ok(Acquisition::AlreadyHeld),
			Acquisition::NewlyAcquired => {
				self.set(&semaphore, version).await?;
				Ok(Acquisition::NewlyAcquired)
			}
		}
	}

	/// Removes `id` as a holder of the semaphore, if held.
	///
	/// The write runs even when the id was not holding a slot, so the
	/// operation is idempotent from the client's point of view. Returns
	/// the post-image semaphore for metrics publication.
	pub async fn unlock_if_held(&mut self, id: &str) -> Result<Semaphore, LockError> {
		let (mut semaphore, version) = self.get().await?;

		semaphore.unlock_if_held(id);
		self.set(&semaphore, version).await?;

		Ok(semaphore)
	}

	/// Returns the current semaphore value, read-only.
	pub async fn fetch_semaphore(&mut self) -> Result<Semaphore, LockError> {
		let (semaphore, _version) = self.get().await?;
		Ok(semaphore)
	}

	/// Initializes the semaphore key, if it does not exist yet.
	async fn ensure_init(&mut self, slots: u64) -> Result<(), LockError> {
		let value = serde_json::to_string(&Semaphore::new(slots))?;

		// version=0 means that the key does not exist.
		let txn = Txn::new()
			.when(vec![Compare::version(self.key_path.as_str(), CompareOp::Equal, 0)])
			.and_then(vec![TxnOp::put(self.key_path.as_str(), value, None)]);
		self.client.txn(txn).await?;

		Ok(())
	}

	/// Returns the current semaphore value and its key version.
	async fn get(&mut self) -> Result<(Semaphore, i64), LockError> {
		let resp = self.client.get(self.key_path.as_str(), None).await?;

		let kv = match resp.kvs() {
			[kv] => kv,
			_ => return Err(LockError::MissingRecord),
		};
		if kv.version() == 0 {
			return Err(LockError::MissingRecord);
		}
		if kv.value().is_empty() {
			return Err(LockError::EmptyRecord);
		}

		let semaphore = serde_json::from_slice(kv.value())?;
		Ok((semaphore, kv.version()))
	}

	/// Writes the semaphore back, if the key version is still the one
	/// previously observed. A failed predicate means a concurrent writer
	/// won the race.
	async fn set(&mut self, semaphore: &Semaphore, version: i64) -> Result<(), LockError> {
		let value = serde_json::to_string(semaphore)?;

		let txn = Txn::new()
			.when(vec![Compare::version(self.key_path.as_str(), CompareOp::Equal, version)])
			.and_then(vec![TxnOp::put(self.key_path.as_str(), value, None)]);
		let resp = self.client.txn(txn).await?;

		if !resp.succeeded() {
			return Err(LockError::Conflict);
		}
		Ok(())
	}
}
