//! Location of the helper source that needs patching.

use std::path::Path;

/// Path of the helper source below the library checkout, relative to
/// wherever PlatformIO placed the library.
pub const TARGET_RELATIVE_PATH: &str = "LilyGo-AMOLED-Series/src/LV_Helper_v9.cpp";

/// Build the recursive glob pattern `<root>/**/<TARGET_RELATIVE_PATH>`.
///
/// The root is escaped so that directory names containing glob
/// metacharacters (`[`, `*`, `?`) are matched literally.
pub fn target_pattern(root: &Path) -> String {
    let root = root.to_string_lossy();
    let escaped = glob::Pattern::escape(root.trim_end_matches(['/', '\\']));
    format!("{escaped}/**/{TARGET_RELATIVE_PATH}")
}

/// Patterns for the dependency cache tree and the build-output tree, in the
/// order the hook visits them.
pub fn target_patterns(libdeps_dir: &Path, build_dir: &Path) -> [String; 2] {
    [target_pattern(libdeps_dir), target_pattern(build_dir)]
}
