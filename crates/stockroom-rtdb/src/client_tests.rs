//! Tests for Realtime Database client functionality.

use std::time::Duration;

use serial_test::serial;

use crate::client::RtdbConfig;
use crate::error::RtdbError;

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_429() {
    let err = RtdbError::from_http_status(429, "rate limited");
    assert!(matches!(err, RtdbError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_500() {
    let err = RtdbError::from_http_status(500, "internal error");
    assert!(matches!(err, RtdbError::ServerError(500, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_503() {
    let err = RtdbError::from_http_status(503, "service unavailable");
    assert!(matches!(err, RtdbError::ServerError(503, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_400() {
    let err = RtdbError::from_http_status(400, "bad request");
    assert!(matches!(err, RtdbError::RequestFailed(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_404() {
    let err = RtdbError::from_http_status(404, "not found");
    assert!(matches!(err, RtdbError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_401() {
    let err = RtdbError::from_http_status(401, "missing auth");
    assert!(matches!(err, RtdbError::PermissionDenied(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_403() {
    let err = RtdbError::from_http_status(403, "rules rejected write");
    assert!(matches!(err, RtdbError::PermissionDenied(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_http_status_getter() {
    assert_eq!(RtdbError::RateLimited(1000).http_status(), Some(429));
    assert_eq!(
        RtdbError::ServerError(502, "bad gateway".into()).http_status(),
        Some(502)
    );
    assert_eq!(
        RtdbError::NotFound("node".into()).http_status(),
        Some(404)
    );
    assert_eq!(RtdbError::missing_id("update").http_status(), None);
    assert_eq!(RtdbError::stream_closed("cancelled").http_status(), None);
}

#[test]
fn test_error_retry_after_ms() {
    assert_eq!(RtdbError::RateLimited(5000).retry_after_ms(), Some(5000));
    assert_eq!(
        RtdbError::ServerError(500, "error".into()).retry_after_ms(),
        None
    );
}

#[test]
fn test_missing_id_message_names_the_operation() {
    let err = RtdbError::missing_id("delete");
    assert_eq!(
        format!("{}", err),
        "Record has no id: delete requires a stored record"
    );
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_requires_database_url() {
    std::env::remove_var("RTDB_DATABASE_URL");
    std::env::remove_var("FIREBASE_DATABASE_URL");
    let result = RtdbConfig::from_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_config_rejects_empty_database_url() {
    std::env::set_var("RTDB_DATABASE_URL", "");
    std::env::remove_var("FIREBASE_DATABASE_URL");
    let result = RtdbConfig::from_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_config_rejects_unparseable_database_url() {
    std::env::set_var("RTDB_DATABASE_URL", "not a url");
    let result = RtdbConfig::from_env();
    assert!(matches!(result, Err(RtdbError::Config(_))));
}

#[test]
#[serial]
fn test_config_accepts_firebase_database_url() {
    std::env::remove_var("RTDB_DATABASE_URL");
    std::env::set_var(
        "FIREBASE_DATABASE_URL",
        "https://stockroom-alias.firebaseio.com",
    );
    let config = RtdbConfig::from_env().unwrap();
    assert_eq!(config.database_url.host_str(), Some("stockroom-alias.firebaseio.com"));
}

#[test]
#[serial]
fn test_config_prefers_rtdb_database_url() {
    std::env::set_var("RTDB_DATABASE_URL", "https://stockroom-main.firebaseio.com");
    std::env::set_var(
        "FIREBASE_DATABASE_URL",
        "https://stockroom-alias.firebaseio.com",
    );
    let config = RtdbConfig::from_env().unwrap();
    assert_eq!(config.database_url.host_str(), Some("stockroom-main.firebaseio.com"));
}

#[test]
#[serial]
fn test_config_parses_timeout_env_vars() {
    std::env::set_var("RTDB_DATABASE_URL", "https://stockroom-test.firebaseio.com");
    std::env::set_var("RTDB_TIMEOUT_SECS", "60");
    std::env::set_var("RTDB_CONNECT_TIMEOUT_SECS", "15");
    let config = RtdbConfig::from_env().unwrap();
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.connect_timeout, Duration::from_secs(15));
}

#[test]
#[serial]
fn test_config_handles_invalid_env_values() {
    std::env::set_var("RTDB_DATABASE_URL", "https://stockroom-test.firebaseio.com");
    std::env::set_var("RTDB_TIMEOUT_SECS", "not-a-number");
    std::env::set_var("RTDB_CONNECT_TIMEOUT_SECS", "not-a-number");
    let config = RtdbConfig::from_env().unwrap();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
}

#[test]
#[serial]
fn test_config_default_values() {
    std::env::set_var("RTDB_DATABASE_URL", "https://stockroom-test.firebaseio.com");
    std::env::remove_var("RTDB_TIMEOUT_SECS");
    std::env::remove_var("RTDB_CONNECT_TIMEOUT_SECS");
    let config = RtdbConfig::from_env().unwrap();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
}
