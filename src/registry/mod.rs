//! Subscription registry and dispatcher.
//!
//! Independent of the transport: the registry only knows topics and
//! listeners, and the dispatcher only knows envelopes.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `listener` | [`Listener`] trait |
//! | `store` | [`Registry`] topic → listeners map |
//! | `dispatcher` | [`Dispatcher`] inbound routing |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound frame routing.
pub mod dispatcher;

/// Listener trait.
pub mod listener;

/// Topic to listener mapping.
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use listener::Listener;
pub use store::{Registration, Registry, Removal};
