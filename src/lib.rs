//! LV Helper patch: PlatformIO pre-build hook for the LilyGo AMOLED series
//!
//! The LilyGo helper library defines its own `static uint32_t lv_tick_get_cb(`
//! which collides with LVGL 9's symbol of the same name. Before compilation
//! this hook finds every copy of `LV_Helper_v9.cpp` under the dependency
//! cache and the build-output tree and renames the helper's callback to
//! `my_lv_tick_get_cb`.
//!
//! # Guarantees
//!
//! - Replacements are literal substrings, applied in a fixed order
//! - A file is written only when its content actually changes
//! - Writes are atomic (tempfile + fsync + rename)
//! - Re-running is a no-op
//!
//! # Example
//!
//! ```no_run
//! use lv_helper_patch::{patch, target_patterns};
//! use std::path::Path;
//!
//! let [libdeps, build] = target_patterns(Path::new(".pio/libdeps"), Path::new(".pio/build"));
//! for pattern in [libdeps, build] {
//!     let report = patch([pattern])?;
//!     println!("{} file(s) patched", report.patched_count());
//! }
//! # Ok::<(), lv_helper_patch::PatchError>(())
//! ```

pub mod config;
pub mod discover;
pub mod rule;
pub mod runner;
pub mod target;

// Re-exports
pub use config::{find_project_root, BuildEnv, HookConfig, Overrides};
pub use discover::{expand, DiscoverError};
pub use rule::{apply_rules, PatchRule, RuleStatus, LV_TICK_RULES};
pub use runner::{patch, FileOutcome, PatchError, PatchReport, Patcher};
pub use target::{target_pattern, target_patterns, TARGET_RELATIVE_PATH};
