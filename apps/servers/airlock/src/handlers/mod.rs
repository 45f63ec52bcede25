pub mod identity;
pub mod pre_reboot;
pub mod steady_state;

pub use identity::{validate_identity, NodeIdentity};
