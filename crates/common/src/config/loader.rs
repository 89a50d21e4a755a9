use crate::config::components::definition::DefinitionFile;
use crate::config::components::provisioner::{ProvisionerConfig, ProvisionerProjectConfig};
use crate::config::error::{ConfigError, DefinitionError};
use crate::types::DashboardDefinition;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_FILE: &str = "provisioner.yml";

/// Parse a dashboard definition from YAML (or JSON) text.
pub fn parse_definition(raw: &str) -> Result<DashboardDefinition, DefinitionError> {
    let file: DefinitionFile = serde_yaml::from_str(raw)?;
    DashboardDefinition::try_from(file)
}

pub fn load_definition(path: &Path) -> Result<DashboardDefinition, DefinitionError> {
    debug!("loading dashboard definition from {}", path.display());
    let raw = fs::read_to_string(path).map_err(|e| DefinitionError::unreadable(path, e))?;
    parse_definition(&raw)
}

/// Read `provisioner.yml` from `project_config_path` (or the working directory)
/// and resolve the definition path against the config file's directory.
pub fn read_config(project_config_path: Option<PathBuf>) -> Result<ProvisionerConfig, ConfigError> {
    let config_file_path = match project_config_path {
        Some(dir) => dir.join(PROJECT_CONFIG_FILE),
        None => PathBuf::from(PROJECT_CONFIG_FILE),
    };
    if !config_file_path.exists() {
        return Err(ConfigError::incorrect_path(&config_file_path));
    }

    let file = fs::File::open(&config_file_path)?;
    let project: ProvisionerProjectConfig = serde_yaml::from_reader(file)?;

    if project.reconcile.concurrency == 0 {
        return Err(ConfigError::invalid_setting(
            "reconcile.concurrency must be at least 1",
        ));
    }
    if project.reconcile.call_timeout_ms == 0 {
        return Err(ConfigError::invalid_setting(
            "reconcile.call_timeout_ms must be greater than zero",
        ));
    }

    let config_root = config_file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let definition_path = resolve_path(&config_root, &project.definition);
    if !definition_path.exists() {
        return Err(ConfigError::incorrect_path(&definition_path));
    }

    Ok(ProvisionerConfig {
        definition_path,
        remote: project.remote,
        reconcile: project.reconcile,
    })
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
