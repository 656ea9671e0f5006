//! Bootstrap Lifecycle Ports
//!
//! Optional capabilities a [`Service`](crate::di::Service) exposes to take
//! part in the bootstrap phases.
//!
//! | Phase | Hook | Failure policy |
//! |-------|------|----------------|
//! | register | [`Registrable::register`] | fatal, aborts boot |
//! | load | [`Loadable::load`] | logged, next service continues |

use crate::error::Result;
use async_trait::async_trait;

/// Wiring hook run once every provider has been instantiated
#[async_trait]
pub trait Registrable: Send + Sync {
    /// Register handlers, menus or routes owned by this service
    async fn register(&self) -> Result<()>;
}

/// Initial state hook run after the register phase completed
#[async_trait]
pub trait Loadable: Send + Sync {
    /// Fetch the initial state of this service
    async fn load(&self) -> Result<()>;
}
