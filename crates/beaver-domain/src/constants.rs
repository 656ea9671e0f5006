//! Domain layer constants
//!
//! Values that are part of the persisted state format or the public
//! behaviour of the services. Infrastructure-specific constants live in
//! `beaver_infrastructure::constants`.

// ============================================================================
// NAVIGATION TABS
// ============================================================================

/// Storage namespace of the per-user tabs state
pub const NAVIGATION_TABS_BASE_KEY: &str = "navigation_tabs";

/// Storage namespace of the tabs map
pub const NAVIGATION_TABS_MAP_KEY: &str = "navigation_tabs_tab_map";

/// User id used before any user has signed in
pub const ANONYMOUS_USER_ID: &str = "anonymous";

/// Capacity of the tab select/close notification channels
pub const TAB_EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// RESOURCES
// ============================================================================

/// Capacity of the per-resource change notification channel
pub const RESOURCE_EVENT_CHANNEL_CAPACITY: usize = 256;
