pub mod error;
pub mod manager;
pub mod semaphore;

pub use error::LockError;
pub use manager::{Manager, TlsMaterial};
pub use semaphore::{Acquisition, Release, Semaphore};
