//! Port definitions
//!
//! Contracts implemented by the infrastructure layer and consumed by
//! services.

pub mod lifecycle;
pub mod storage;
pub mod transport;

pub use lifecycle::{Loadable, Registrable};
pub use storage::StateStorage;
pub use transport::GraphQlTransport;
