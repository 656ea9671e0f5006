//! # Domain Layer
//!
//! Core types shared by every layer of Beaver Core.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Domain error taxonomy and `Result` alias |
//! | [`di`] | Provider tokens, resolved dependencies and the service capability model |
//! | [`ports`] | Transport, persistence and lifecycle contracts |
//! | [`value_objects`] | Server configuration, drivers and navigation tabs |
//! | [`constants`] | Storage keys and channel capacities |

pub mod constants;
pub mod di;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use di::{Dependencies, Injectable, Service, Token};
pub use error::{Error, Result};
