use std::io;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
	#[error("etcd3 backend error: {0}")]
	Backend(#[from] etcd_client::Error),

	#[error("semaphore key missing from the backend")]
	MissingRecord,

	#[error("empty semaphore value")]
	EmptyRecord,

	#[error("malformed semaphore value: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("conflict on semaphore detected, aborting")]
	Conflict,

	#[error("all {total_slots} semaphore slots currently locked")]
	Full { total_slots: u64 },

	#[error("failed to read TLS client material from {path}: {source}")]
	TlsMaterial { path: String, source: io::Error },
}
