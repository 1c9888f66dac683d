//! Shared fixtures for unit tests.

use std::fs;
use tempfile::TempDir;

/// Creates a temporary directory populated with the given files.
///
/// Parent directories are created as needed. The directory is removed when
/// the returned handle is dropped.
pub fn create_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");

    for (path, contents) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&full_path, contents).expect("Failed to write file");
    }

    dir
}

/// A small design-system fixture: a root stylesheet importing a token
/// layer, a helper module and a component that re-declares one token.
pub fn design_system() -> TempDir {
    create_tree(&[
        (
            "globals/scss/styles.scss",
            "@import 'tokens';\n@import 'helpers';\n@import '../../components/button/button';\n",
        ),
        (
            "globals/scss/_tokens.scss",
            "$brand: #0062ff;\n$spacing: 8px;\n",
        ),
        (
            "globals/scss/_helpers.scss",
            "@import 'tokens';\n\n@function rem($px) {\n  @return $px / 16px * 1rem;\n}\n\n@mixin focus-outline {\n  outline: 2px solid $brand;\n}\n",
        ),
        (
            "components/button/_button.scss",
            "@import '../../globals/scss/helpers';\n\n$brand: #ff0000;\n\n.btn {\n  color: $brand;\n  padding: rem(16px);\n}\n\n.btn:hover #main {\n  @include focus-outline;\n  text-decoration: underline;\n}\n\n@media (max-width: 600px) {\n  .btn { display: block; }\n}\n",
        ),
    ])
}
