use crate::{Config, ConfigSection};
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok, some};
use serial_test::serial;

// =========================================================================
// Validation Tests - Readiness and Updates
// =========================================================================

#[test]
#[serial]
fn given_probe_interval_below_min_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _interval = EnvGuard::set("MD_READINESS_PROBE_INTERVAL_MS", "10");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_load_retry_interval_over_max_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _interval = EnvGuard::set("MD_READINESS_LOAD_RETRY_INTERVAL_MS", "60000");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_request_timeout_below_min_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _timeout = EnvGuard::set("MD_READINESS_REQUEST_TIMEOUT_MS", "5");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_load_confirm_timeout_over_max_when_validate_then_error_names_setting() {
    // Given
    let _temp = setup_config_dir();
    let _timeout = EnvGuard::set("MD_READINESS_LOAD_CONFIRM_TIMEOUT_MS", "45000");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    let error = result.unwrap_err();
    assert_that!(error.section(), some(eq(ConfigSection::Readiness)));
    assert!(error.to_string().contains("readiness.load_confirm_timeout_ms"));
}

#[test]
#[serial]
fn given_update_delay_over_max_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _delay = EnvGuard::set("MD_UPDATES_CHECK_DELAY_MS", "900000");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_zero_update_delay_when_validate_then_ok() {
    // Given
    let _temp = setup_config_dir();
    let _delay = EnvGuard::set("MD_UPDATES_CHECK_DELAY_MS", "0");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}
