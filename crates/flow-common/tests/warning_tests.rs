//! Tests for warning deduplication.

use flow_common::warning::{has_warned, set_quiet, warn_once};

#[test]
fn test_warn_once_records_message() {
    set_quiet(true);
    assert!(!has_warned("Test", "recorded once"));
    warn_once("Test", "recorded once");
    assert!(has_warned("Test", "recorded once"));
    // A second identical warning is a no-op.
    warn_once("Test", "recorded once");
    assert!(has_warned("Test", "recorded once"));
}

#[test]
fn test_warnings_are_keyed_by_component() {
    set_quiet(true);
    warn_once("Selector", "shared message");
    assert!(has_warned("Selector", "shared message"));
    assert!(!has_warned("XPath", "shared message"));
}
