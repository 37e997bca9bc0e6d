//! orbi-core library.
//!
//! Publishes successive versions of a file as signed events to a set of
//! independent relays, and keeps the local pointers that tie those versions
//! into a chain.
//!
//! - [`store`]: `.orbi/` root and head pointers plus the tracked-file list.
//! - [`event`]: event model and the pure version/confluence builders.
//! - [`signer`]: key loading and Schnorr signing.
//! - [`relay`]: relay client seam and the concurrent broadcaster.
//! - [`chain`]: publish, commit and confluence flows over the pieces above.
//! - [`config`]: flag, env and file layers resolved into one config.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per module, each with a stable
//!   [`ErrorCode`](error::ErrorCode).
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod chain;
pub mod config;
pub mod error;
pub mod event;
pub mod relay;
pub mod signer;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{Chain, ChainError};
pub use error::ErrorCode;
pub use relay::{AckPolicy, BroadcastConfig, Broadcaster, WsRelayClient};
pub use signer::{SecretKeySigner, Signer};
pub use store::ChainStore;
