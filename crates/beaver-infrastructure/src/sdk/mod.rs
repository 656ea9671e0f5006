//! GraphQL SDK
//!
//! The transport implementation, the injectable [`GraphQlService`] and the
//! operations used by the built-in resources.

pub mod graphql;
pub mod operations;

pub use graphql::{
    GraphQlService, HttpGraphQlTransport, TransportBinding, operation_name, unwrap_response,
};
