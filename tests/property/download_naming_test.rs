//! Property-based tests for download save-path disambiguation.
//!
//! These tests verify that repeatedly saving a file of the same name into
//! one directory always yields a fresh, non-colliding path, and that the
//! extension survives the renaming.

use cormorant::sessions_service::unique_save_path;
use proptest::prelude::*;

/// Strategy for generating download file names: a stem plus an optional
/// extension, all filesystem-safe ASCII.
fn arb_file_name() -> impl Strategy<Value = String> {
    (
        "[a-zA-Z][a-zA-Z0-9 _-]{0,20}",
        proptest::option::of(prop_oneof![
            Just("pdf"),
            Just("tar.gz"),
            Just("crx"),
            Just("txt"),
        ]),
    )
        .prop_map(|(stem, ext)| match ext {
            Some(ext) => format!("{}.{}", stem.trim(), ext),
            None => stem.trim().to_string(),
        })
        .prop_filter("stem must survive trimming", |name| !name.starts_with('.') && !name.is_empty())
}

// **Property: collision-free save paths**
//
// *For any* file name and number of repeats, each call to `unique_save_path`
// followed by creating the file yields a path that did not exist before,
// never collides with an earlier pick, and keeps the original extension.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn repeated_downloads_never_collide(
        file_name in arb_file_name(),
        repeats in 1..6usize,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut picked = Vec::new();

        for _ in 0..repeats {
            let path = unique_save_path(dir.path(), &file_name);

            prop_assert!(
                !path.exists(),
                "unique_save_path returned an existing path: {:?}",
                path
            );
            prop_assert!(
                !picked.contains(&path),
                "Path {:?} was already picked in this run",
                path
            );
            prop_assert_eq!(path.parent(), Some(dir.path()));

            // The extension must survive the " (n)" disambiguation.
            if let Some((_, ext)) = file_name.rsplit_once('.') {
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                prop_assert!(
                    name.ends_with(&format!(".{}", ext)),
                    "Picked name {:?} lost the extension .{}",
                    name,
                    ext
                );
            }

            std::fs::write(&path, b"payload").unwrap();
            picked.push(path);
        }

        // The very first pick is always the undecorated name.
        prop_assert_eq!(&picked[0], &dir.path().join(&file_name));
    }
}
