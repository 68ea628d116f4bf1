//! Output artifact path derivation
//!
//! The patched package lands next to nothing the engine chooses: the
//! front-end decides the artifact path up front, derives it from the input
//! package's base name, and de-duplicates against files already present in
//! the output directory.

use std::path::{Path, PathBuf};

/// Suffix appended to the input's base name for the patched artifact
const OUTPUT_SUFFIX: &str = "-revanced";

/// File extension of the patched artifact
const OUTPUT_EXTENSION: &str = "apk";

/// Derives the artifact path for `input` inside `output_dir`.
///
/// `app.apk` becomes `app-revanced.apk`. If that file already exists, a
/// ` (n)` suffix is inserted before the extension with the smallest `n`
/// (starting at 1) that does not collide: `app-revanced (1).apk`,
/// `app-revanced (2).apk`, and so on.
pub fn derive_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let base = format!("{stem}{OUTPUT_SUFFIX}");
    let mut candidate = output_dir.join(format!("{base}.{OUTPUT_EXTENSION}"));
    let mut n = 1u32;
    while candidate.exists() {
        candidate = output_dir.join(format!("{base} ({n}).{OUTPUT_EXTENSION}"));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_basic_derivation() {
        let dir = tempfile::tempdir().unwrap();
        let path = derive_output_path(Path::new("/somewhere/app.apk"), dir.path());
        assert_eq!(path, dir.path().join("app-revanced.apk"));
    }

    #[test]
    fn test_collision_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app-revanced.apk"), b"").unwrap();

        let path = derive_output_path(Path::new("app.apk"), dir.path());
        assert_eq!(path, dir.path().join("app-revanced (1).apk"));
    }

    #[test]
    fn test_counter_skips_existing_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app-revanced.apk"), b"").unwrap();
        fs::write(dir.path().join("app-revanced (1).apk"), b"").unwrap();

        let path = derive_output_path(Path::new("app.apk"), dir.path());
        assert_eq!(path, dir.path().join("app-revanced (2).apk"));
    }

    #[test]
    fn test_extension_is_always_apk() {
        let dir = tempfile::tempdir().unwrap();
        let path = derive_output_path(Path::new("bundle.xapk"), dir.path());
        assert_eq!(path, dir.path().join("bundle-revanced.apk"));
    }
}
