use crate::ProvisionError;
use common::config::loader::load_definition;
use common::types::DashboardDefinition;
use std::path::Path;

pub fn validate(definition: &DashboardDefinition) -> Result<(), ProvisionError> {
    validator::validate(definition)?;
    Ok(())
}

/// Load and validate a definition file, returning the model when it is sound.
pub fn validate_file(path: &Path) -> Result<DashboardDefinition, ProvisionError> {
    let definition = load_definition(path)?;
    validate(&definition)?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{TELEMATICS_DASHBOARD, telematics_definition};

    #[test]
    fn telematics_definition_file_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yml");
        std::fs::write(&path, TELEMATICS_DASHBOARD).unwrap();

        let loaded = validate_file(&path).unwrap();
        assert_eq!(loaded, telematics_definition());
    }

    #[test]
    fn unreadable_file_is_a_definition_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_file(&dir.path().join("missing.yml")),
            Err(ProvisionError::Definition(_))
        ));
    }
}
