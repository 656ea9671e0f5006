//! Operations of the built-in resources

use beaver_domain::value_objects::{DbDriver, ServerConfig};
use serde::Deserialize;

pub const SERVER_CONFIG_QUERY: &str = r"query serverConfig {
  serverConfig {
    name
    version
    anonymousAccessEnabled
    authenticationEnabled
    configurationMode
    supportCustomConnections
    supportedLanguages
  }
}";

pub const DRIVER_LIST_QUERY: &str = r"query driverList($driverId: ID) {
  driverList(id: $driverId) {
    id
    name
    icon
    description
    defaultPort
    defaultDatabase
    defaultServer
    defaultUser
    sampleURL
    embedded
    anonymousAccess
    promotedScore
    defaultAuthModel
  }
}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigData {
    pub server_config: ServerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverListData {
    pub driver_list: Vec<DbDriver>,
}
