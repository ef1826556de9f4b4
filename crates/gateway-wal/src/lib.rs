//! Durable write-ahead queue for outbound events.
//!
//! Every published event is recorded here before transmission and removed
//! only once the remote collector acknowledges it, so delivery survives
//! process crashes and network outages.

mod error;
mod keys;
mod store;

pub use error::{WalError, WalResult};
pub use keys::{composite_key, split_composite_key};
pub use store::WalStore;
