use std::path::{Path, PathBuf};

use crate::defaults::DeploySettings;

/// Project config file looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "stackdeploy.json";

/// Binary name staged when no `bin` is configured.
pub const DEFAULT_BINARY: &str = "bot";

/// Project config file path for a directory.
pub fn project_config(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
}

/// Where cargo leaves the release binary for the configured target.
pub fn build_output(settings: &DeploySettings) -> PathBuf {
    let binary = settings.bin.as_deref().unwrap_or(DEFAULT_BINARY);
    settings
        .manifest_dir
        .join("target")
        .join(&settings.target)
        .join("release")
        .join(binary)
}

/// Staged entrypoint the template's code asset points at.
pub fn staged_bootstrap(settings: &DeploySettings) -> PathBuf {
    settings.staging_dir.join(&settings.bootstrap_name)
}

/// Expand `~` in a configured path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
