//! Integration test for logger initialisation.
use ecoplan::log::{LOG_LEVEL_ENV_VAR, init, is_logger_initialised};
use tempfile::tempdir;

/// The logger can only be initialised once per process, so this is a single test.
#[test]
fn test_init_logger() {
    unsafe { std::env::set_var(LOG_LEVEL_ENV_VAR, "off") };
    let dir = tempdir().unwrap();

    assert!(!is_logger_initialised());
    init(Some("debug"), Some(dir.path())).unwrap();
    assert!(is_logger_initialised());
    assert!(dir.path().join("ecoplan_info.log").is_file());
    assert!(dir.path().join("ecoplan_error.log").is_file());

    assert_eq!(
        init(None, None).unwrap_err().to_string(),
        "Logger already initialised"
    );
}
