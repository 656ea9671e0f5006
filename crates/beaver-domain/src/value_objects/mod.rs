//! Value objects

pub mod driver;
pub mod server_config;
pub mod tab;

pub use driver::DbDriver;
pub use server_config::ServerConfig;
pub use tab::{Tab, TabsState};
