//! Tests for error context conversion

use beaver_domain::error::Error;
use beaver_infrastructure::ErrorContext;
use std::io;

fn io_failure() -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
}

#[test]
fn test_category_contexts() {
    assert!(matches!(
        io_failure().storage_context("state").unwrap_err(),
        Error::Storage { source: Some(_), .. }
    ));
    assert!(matches!(
        io_failure().config_context("config").unwrap_err(),
        Error::Configuration { source: Some(_), .. }
    ));
    assert!(matches!(
        io_failure().network_context("request").unwrap_err(),
        Error::Transport { source: Some(_), .. }
    ));
}
