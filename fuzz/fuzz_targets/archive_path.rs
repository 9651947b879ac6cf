//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked for every accepted path:
//! - no `.`, `..` or empty segments
//! - not absolute
//! - no NUL bytes
//! - `parent` and `file_name` recombine to the original path

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = sevenlink::ArchivePath::new(text) else {
        return;
    };
    let normalized = path.as_str();

    assert!(
        !normalized
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == ".."),
        "Invalid segment accepted: {:?}",
        normalized
    );
    assert!(
        !normalized.starts_with('/'),
        "Absolute path accepted: {:?}",
        normalized
    );
    assert!(
        !normalized.contains('\0'),
        "NUL byte in path: {:?}",
        normalized
    );

    match path.parent() {
        Some(parent) => assert_eq!(
            format!("{}/{}", parent.as_str(), path.file_name()),
            normalized
        ),
        None => assert_eq!(path.file_name(), normalized),
    }
});
