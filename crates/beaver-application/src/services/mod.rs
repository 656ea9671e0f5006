//! Application services

pub mod auto_save;
pub mod navigation_tabs;
pub mod tab_navigator;

pub use auto_save::{AutoSave, LocalStorageSaveService, StorageBinding};
pub use navigation_tabs::{NavigationTabsService, TabHandler};
pub use tab_navigator::{NavigationAction, NavigationKind, TabNavigator};
