use std::{fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "layoutctl.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub layout_design_base: String,
    pub layout_apply_base: String,
    pub configuration_manager_base: String,
    pub policy_manager_base: String,
    pub list_limit: usize,
    pub allow_control: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout_design_base: "http://localhost:8011/cdim/api/v1".into(),
            layout_apply_base: "http://localhost:8013/cdim/api/v1".into(),
            configuration_manager_base: "http://localhost:8080/cdim/api/v1".into(),
            policy_manager_base: "http://localhost:8014/cdim/api/v1".into(),
            list_limit: 1000,
            allow_control: false,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    layout_design_base: Option<String>,
    layout_apply_base: Option<String>,
    configuration_manager_base: Option<String>,
    policy_manager_base: Option<String>,
    list_limit: Option<usize>,
    allow_control: Option<bool>,
    log_filter: Option<String>,
}

/// Defaults, then the settings file, then environment overrides.
///
/// An explicit `path` must exist; without one `layoutctl.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_SETTINGS_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw)?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    normalize(&mut settings)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw).context("malformed settings file")?;

    if let Some(v) = file_cfg.layout_design_base {
        settings.layout_design_base = v;
    }
    if let Some(v) = file_cfg.layout_apply_base {
        settings.layout_apply_base = v;
    }
    if let Some(v) = file_cfg.configuration_manager_base {
        settings.configuration_manager_base = v;
    }
    if let Some(v) = file_cfg.policy_manager_base {
        settings.policy_manager_base = v;
    }
    if let Some(v) = file_cfg.list_limit {
        settings.list_limit = v;
    }
    if let Some(v) = file_cfg.allow_control {
        settings.allow_control = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

/// Plain names first, `APP__` names win when both are set.
fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |name: &str| lookup(&format!("APP__{name}")).or_else(|| lookup(name));

    if let Some(v) = var("LAYOUT_DESIGN_BASE") {
        settings.layout_design_base = v;
    }
    if let Some(v) = var("LAYOUT_APPLY_BASE") {
        settings.layout_apply_base = v;
    }
    if let Some(v) = var("CONFIGURATION_MANAGER_BASE") {
        settings.configuration_manager_base = v;
    }
    if let Some(v) = var("POLICY_MANAGER_BASE") {
        settings.policy_manager_base = v;
    }
    if let Some(v) = lookup("LAYOUTCTL_LIST_LIMIT") {
        settings.list_limit = v
            .trim()
            .parse()
            .with_context(|| format!("LAYOUTCTL_LIST_LIMIT must be a number, got '{v}'"))?;
    }
    if let Some(v) = lookup("LAYOUTCTL_ALLOW_CONTROL") {
        settings.allow_control = parse_flag(&v)
            .with_context(|| format!("LAYOUTCTL_ALLOW_CONTROL must be a boolean, got '{v}'"))?;
    }
    if let Some(v) = lookup("LAYOUTCTL_LOG") {
        settings.log_filter = v;
    }
    Ok(())
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognized flag value '{other}'"),
    }
}

fn normalize(settings: &mut Settings) -> anyhow::Result<()> {
    for (name, base) in [
        ("layout_design_base", &mut settings.layout_design_base),
        ("layout_apply_base", &mut settings.layout_apply_base),
        (
            "configuration_manager_base",
            &mut settings.configuration_manager_base,
        ),
        ("policy_manager_base", &mut settings.policy_manager_base),
    ] {
        *base = normalize_base_url(base)
            .with_context(|| format!("invalid {name} '{}'", base.trim()))?;
    }

    if settings.list_limit == 0 {
        bail!("list_limit must be greater than zero");
    }
    Ok(())
}

fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme '{}'", url.scheme());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
