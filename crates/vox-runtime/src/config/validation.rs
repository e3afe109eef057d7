//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, SkillConfig, SkillInfo};

/// Validates the entire configuration.
///
/// Unknown log levels never reach this point: they fail to deserialize.
pub fn validate_config(config: &SkillConfig) -> ConfigResult<()> {
    validate_skill_info(&config.skill)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_skill_info(skill: &SkillInfo) -> ConfigResult<()> {
    if skill.name.trim().is_empty() {
        return Err(ConfigError::missing_field("skill.name"));
    }

    if skill.locales.iter().any(|locale| locale.trim().is_empty()) {
        return Err(ConfigError::invalid("Locales cannot be empty strings"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.is_empty()) {
        return Err(ConfigError::invalid("Logging filters need a module name"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SkillConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_skill_name() {
        let mut config = SkillConfig::default();
        config.skill.name = "  ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "skill.name"
        ));
    }

    #[test]
    fn test_validate_file_output_without_path() {
        let mut config = SkillConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/skill.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_filters() {
        let mut config = SkillConfig::default();
        config.logging.filters.insert(String::new(), LogLevel::Debug);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
