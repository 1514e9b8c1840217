use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths;

/// Fully resolved deploy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySettings {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    pub manifest_dir: PathBuf,
    pub bootstrap_name: String,
    pub staging_dir: PathBuf,
    pub template: PathBuf,
    pub packaged_template: PathBuf,
    pub capabilities: Vec<String>,
    pub secret_parameter: String,
    pub output_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            target: default_target(),
            bin: None,
            manifest_dir: PathBuf::from("."),
            bootstrap_name: "bootstrap".to_string(),
            staging_dir: PathBuf::from("."),
            template: PathBuf::from("template.yaml"),
            packaged_template: PathBuf::from("packaged.yaml"),
            capabilities: vec!["CAPABILITY_IAM".to_string()],
            secret_parameter: "SlackToken".to_string(),
            output_key: "WebhookUrl".to_string(),
            region: None,
            profile: None,
        }
    }
}

fn default_target() -> String {
    "x86_64-unknown-linux-musl".to_string()
}

/// Shape of `stackdeploy.json`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeployFileConfig {
    pub target: Option<String>,
    pub bin: Option<String>,
    pub manifest_dir: Option<String>,
    pub bootstrap_name: Option<String>,
    pub staging_dir: Option<String>,
    pub template: Option<String>,
    pub packaged_template: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub secret_parameter: Option<String>,
    pub output_key: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub target: Option<String>,
    pub bin: Option<String>,
    pub template: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

// =============================================================================
// Loading functions
// =============================================================================

/// Read and parse a config file.
pub fn load_file(path: &Path) -> Result<DeployFileConfig> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::config_invalid_value(
            "config",
            Some(path.display().to_string()),
            "file not found",
        )
        .with_hint("Check the --config path"),
        _ => Error::internal_io(e.to_string(), Some(format!("read {}", path.display()))),
    })?;

    serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

/// Locate the config file: an explicit path must exist, the project file in
/// `dir` is optional.
pub fn find_config(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let project = paths::project_config(dir);
            project.exists().then_some(project)
        }
    }
}

/// Resolve settings: defaults, then file, then environment, then overrides.
pub fn resolve<F>(
    file: Option<DeployFileConfig>,
    env: F,
    overrides: SettingsOverrides,
) -> Result<DeploySettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = DeploySettings::default();

    if let Some(file) = file {
        apply_file(&mut settings, file);
    }

    let env_region = env("AWS_REGION")
        .or_else(|| env("AWS_DEFAULT_REGION"))
        .filter(|v| !v.is_empty());
    if let Some(region) = env_region {
        settings.region = Some(region);
    }
    if let Some(profile) = env("AWS_PROFILE").filter(|v| !v.is_empty()) {
        settings.profile = Some(profile);
    }

    if let Some(target) = overrides.target {
        settings.target = target;
    }
    if let Some(bin) = overrides.bin {
        settings.bin = Some(bin);
    }
    if let Some(template) = overrides.template {
        settings.template = paths::expand(&template);
    }
    if let Some(region) = overrides.region {
        settings.region = Some(region);
    }
    if let Some(profile) = overrides.profile {
        settings.profile = Some(profile);
    }

    validate(&settings)?;
    Ok(settings)
}

/// Resolve settings from the process environment and the config file found
/// for `dir`.
pub fn load(
    explicit: Option<&Path>,
    dir: &Path,
    overrides: SettingsOverrides,
) -> Result<DeploySettings> {
    let file = find_config(explicit, dir)
        .map(|path| load_file(&path))
        .transpose()?;

    resolve(file, |key| std::env::var(key).ok(), overrides)
}

fn apply_file(settings: &mut DeploySettings, file: DeployFileConfig) {
    if let Some(target) = file.target {
        settings.target = target;
    }
    if file.bin.is_some() {
        settings.bin = file.bin;
    }
    if let Some(dir) = file.manifest_dir {
        settings.manifest_dir = paths::expand(&dir);
    }
    if let Some(name) = file.bootstrap_name {
        settings.bootstrap_name = name;
    }
    if let Some(dir) = file.staging_dir {
        settings.staging_dir = paths::expand(&dir);
    }
    if let Some(template) = file.template {
        settings.template = paths::expand(&template);
    }
    if let Some(packaged) = file.packaged_template {
        settings.packaged_template = paths::expand(&packaged);
    }
    if let Some(capabilities) = file.capabilities {
        settings.capabilities = capabilities;
    }
    if let Some(param) = file.secret_parameter {
        settings.secret_parameter = param;
    }
    if let Some(key) = file.output_key {
        settings.output_key = key;
    }
    if file.region.is_some() {
        settings.region = file.region;
    }
    if file.profile.is_some() {
        settings.profile = file.profile;
    }
}

fn validate(settings: &DeploySettings) -> Result<()> {
    let required = [
        ("target", settings.target.as_str()),
        ("bootstrapName", settings.bootstrap_name.as_str()),
        ("secretParameter", settings.secret_parameter.as_str()),
        ("outputKey", settings.output_key.as_str()),
    ];

    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(Error::config_invalid_value(key, None, "must not be empty"));
        }
    }

    if settings.template.as_os_str().is_empty() {
        return Err(Error::config_invalid_value("template", None, "must not be empty"));
    }

    if settings.bin.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(Error::config_invalid_value(
            "bin",
            Some(String::new()),
            "must not be empty when set",
        ));
    }

    // The query embeds the key between single quotes.
    if settings.output_key.contains('\'') {
        return Err(Error::config_invalid_value(
            "outputKey",
            Some(settings.output_key.clone()),
            "must not contain single quotes",
        ));
    }

    Ok(())
}
