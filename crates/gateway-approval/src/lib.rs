//! Session-approval gateway: asynchronous HTTP calls to the external
//! trust service, a blocking adapter for game-server threads, and the
//! domain operations built on both.
//!
//! The call pipeline has three stages. Issue runs on the async runtime and
//! produces a raw fetch outcome. Decode is a pure normalization into an
//! [`ApprovalResult`] where every transport failure collapses to TEMPFAIL.
//! Complete hands the result to the caller's callback on a bounded worker
//! pool, never on the transport task.

mod admin;
mod blocking;
mod dispatcher;
mod error;
mod models;
mod result;
mod service;

pub use dispatcher::{Callback, RequestDispatcher};
pub use error::{ApiResult, ApprovalError};
pub use models::{
    AccountData, BanStatus, CharacterBanEntry, CharacterEntry, Galaxy, GalaxyBanEntry,
    SessionFields,
};
pub use result::{ApprovalAction, ApprovalResult};
pub use service::{ApprovalService, CLIENT_API_VERSION};
