//! Tests for the compile-time TARGET env var set by build.rs and the platform
//! derived from it.

use release_on_tag::platform::{Platform, build_target};

/// The compile-time TARGET value emitted by build.rs.
const TARGET: &str = env!("TARGET");

#[test]
fn build_target_matches_emitted_value() {
    assert_eq!(build_target(), TARGET);
}

#[test]
fn target_has_minimum_segment_count() {
    // arch-vendor-os or arch-os-env
    let segments: Vec<&str> = TARGET.split('-').collect();
    assert!(
        segments.len() >= 3,
        "TARGET '{TARGET}' should have at least 3 hyphen-separated segments, got {}",
        segments.len()
    );
}

#[test]
fn release_hosts_resolve_to_a_known_platform() {
    let platform = Platform::current();
    if ["darwin", "linux", "windows"]
        .iter()
        .any(|os| TARGET.split('-').any(|s| s == *os))
    {
        assert!(
            platform.artifact_pattern().is_some(),
            "TARGET '{TARGET}' should map to a platform with an artifact layout, got {platform}"
        );
    } else {
        assert!(matches!(platform, Platform::Other(_)));
    }
}

#[test]
fn label_is_never_empty() {
    assert!(!Platform::current().label().is_empty());
}
