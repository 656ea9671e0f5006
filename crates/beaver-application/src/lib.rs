//! # Application Layer
//!
//! Services orchestrating domain state on top of the ports.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`executor`] | Sequential named-handler action pipeline |
//! | [`services`] | Auto-saved state, navigation tabs and the tab navigator |

pub mod executor;
pub mod services;

pub use executor::{ExecutionContext, ExecutionReport, Executor, ExecutorHandler};
pub use services::{
    AutoSave, LocalStorageSaveService, NavigationAction, NavigationTabsService, TabHandler,
    TabNavigator,
};
