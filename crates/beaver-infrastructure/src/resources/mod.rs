//! Built-in resources

pub mod db_driver;
pub mod server_config;

pub use db_driver::DbDriverResource;
pub use server_config::ServerConfigResource;
