//! Resolution of the PlatformIO directories the hook searches.

use log::debug;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Marker file at the root of every PlatformIO project.
pub const PROJECT_MARKER: &str = "platformio.ini";

const WORKSPACE_DIR_VAR: &str = "PLATFORMIO_WORKSPACE_DIR";
const LIBDEPS_DIR_VAR: &str = "PLATFORMIO_LIBDEPS_DIR";
const BUILD_DIR_VAR: &str = "PLATFORMIO_BUILD_DIR";
const PIOENV_VAR: &str = "PIOENV";

/// Snapshot of the build orchestrator's environment.
///
/// Only directory resolution consults it; the patch logic never does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    pub pioenv: Option<String>,
    pub workspace_dir: Option<PathBuf>,
    pub libdeps_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
}

impl BuildEnv {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }

    /// Build from explicit key/value pairs. Empty values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        Self {
            pioenv: vars.get(PIOENV_VAR).cloned(),
            workspace_dir: vars.get(WORKSPACE_DIR_VAR).map(PathBuf::from),
            libdeps_dir: vars.get(LIBDEPS_DIR_VAR).map(PathBuf::from),
            build_dir: vars.get(BUILD_DIR_VAR).map(PathBuf::from),
        }
    }
}

/// Explicit overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project_dir: Option<PathBuf>,
    pub libdeps_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
}

/// The two trees the hook searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    pub project_dir: PathBuf,
    pub libdeps_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl HookConfig {
    /// Resolve directories with priority: override, then environment, then
    /// the PlatformIO defaults below `<project>/.pio`.
    ///
    /// Relative paths are resolved against the project directory.
    pub fn resolve(overrides: Overrides, build_env: &BuildEnv, cwd: &Path) -> Self {
        let project_dir = match overrides.project_dir {
            Some(dir) => absolutize(cwd, dir),
            None => find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
        };

        let workspace_dir = build_env
            .workspace_dir
            .clone()
            .map(|dir| absolutize(&project_dir, dir))
            .unwrap_or_else(|| project_dir.join(".pio"));

        let libdeps_dir = overrides
            .libdeps_dir
            .or_else(|| build_env.libdeps_dir.clone())
            .map(|dir| absolutize(&project_dir, dir))
            .unwrap_or_else(|| workspace_dir.join("libdeps"));

        let build_dir = overrides
            .build_dir
            .or_else(|| build_env.build_dir.clone())
            .map(|dir| absolutize(&project_dir, dir))
            .unwrap_or_else(|| workspace_dir.join("build"));

        debug!(
            "env={} project={} libdeps={} build={}",
            build_env.pioenv.as_deref().unwrap_or("-"),
            project_dir.display(),
            libdeps_dir.display(),
            build_dir.display()
        );

        Self {
            project_dir,
            libdeps_dir,
            build_dir,
        }
    }
}

/// Walk up from `start` looking for `platformio.ini`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_MARKER).is_file())
        .map(Path::to_path_buf)
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_below_dot_pio() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cwd = temp_dir.path();

        let config = HookConfig::resolve(Overrides::default(), &BuildEnv::default(), cwd);

        assert_eq!(config.project_dir, cwd);
        assert_eq!(config.libdeps_dir, cwd.join(".pio/libdeps"));
        assert_eq!(config.build_dir, cwd.join(".pio/build"));
    }

    #[test]
    fn test_project_root_found_from_subdirectory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(PROJECT_MARKER), "[env:amoled]\n").unwrap();
        let nested = root.join("src/ui");
        fs::create_dir_all(&nested).unwrap();

        let config = HookConfig::resolve(Overrides::default(), &BuildEnv::default(), &nested);

        assert_eq!(config.project_dir, root);
        assert_eq!(config.libdeps_dir, root.join(".pio/libdeps"));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let cwd = Path::new("/work/fw");
        let build_env = BuildEnv::from_vars([
            ("PLATFORMIO_WORKSPACE_DIR", "/cache/pio"),
            ("PLATFORMIO_BUILD_DIR", "out"),
            ("PIOENV", "t-display-s3"),
        ]);
        let overrides = Overrides {
            project_dir: Some(cwd.to_path_buf()),
            ..Default::default()
        };

        let config = HookConfig::resolve(overrides, &build_env, cwd);

        assert_eq!(build_env.pioenv.as_deref(), Some("t-display-s3"));
        assert_eq!(config.libdeps_dir, PathBuf::from("/cache/pio/libdeps"));
        assert_eq!(config.build_dir, PathBuf::from("/work/fw/out"));
    }

    #[test]
    fn test_flags_override_env() {
        let cwd = Path::new("/work/fw");
        let build_env = BuildEnv::from_vars([
            ("PLATFORMIO_LIBDEPS_DIR", "/env/libdeps"),
            ("PLATFORMIO_BUILD_DIR", "/env/build"),
        ]);
        let overrides = Overrides {
            project_dir: Some(PathBuf::from("/work/fw")),
            libdeps_dir: Some(PathBuf::from("deps")),
            build_dir: Some(PathBuf::from("/flag/build")),
        };

        let config = HookConfig::resolve(overrides, &build_env, cwd);

        assert_eq!(config.libdeps_dir, PathBuf::from("/work/fw/deps"));
        assert_eq!(config.build_dir, PathBuf::from("/flag/build"));
    }

    #[test]
    fn test_empty_env_values_are_unset() {
        let build_env = BuildEnv::from_vars([("PLATFORMIO_BUILD_DIR", "  ")]);
        assert_eq!(build_env, BuildEnv::default());
    }
}
