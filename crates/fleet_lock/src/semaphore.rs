use serde::{Deserialize, Serialize};

use crate::error::LockError;

/// Outcome of a recursive lock attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquisition {
	/// The id already holds a slot; the semaphore was not touched.
	AlreadyHeld,
	/// The id took a free slot.
	NewlyAcquired,
}

/// Outcome of a release attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
	WasHeld,
	WasNotHeld,
}

/// Counted semaphore state for one reboot group.
///
/// `holders` is kept sorted ascending with no duplicates, so two
/// semaphores with equal contents always serialize to the same bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semaphore {
	pub total_slots: u64,
	pub holders: Vec<String>,
}

impl Semaphore {
	/// Returns a new empty semaphore with the given slot limit.
	#[must_use]
	pub const fn new(total_slots: u64) -> Self {
		Self {
			total_slots,
			holders: Vec::new(),
		}
	}

	/// Adds `id` as a holder of the semaphore.
	///
	/// Returns `AlreadyHeld` without mutating when the id already holds a
	/// slot, and `LockError::Full` when every slot is taken.
	pub fn recursive_lock(&mut self, id: &str) -> Result<Acquisition, LockError> {
		match self.holders.binary_search_by(|holder| holder.as_str().cmp(id)) {
			Ok(_) => Ok(Acquisition::AlreadyHeld),
			Err(loc) => {
				if self.holders.len() as u64 >= self.total_slots {
					return Err(LockError::Full { total_slots: self.total_slots });
				}
				self.holders.insert(loc, id.to_string());
				Ok(Acquisition::NewlyAcquired)
			}
		}
	}

	/// Removes `id` from the holders, if present. Never fails.
	pub fn unlock_if_held(&mut self, id: &str) -> Release {
		match self.holders.binary_search_by(|holder| holder.as_str().cmp(id)) {
			Ok(loc) => {
				self.holders.remove(loc);
				Release::WasHeld
			}
			Err(_) => Release::WasNotHeld,
		}
	}
}
