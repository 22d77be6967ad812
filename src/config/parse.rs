use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(inner) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), inner),
        )),
        other => other,
    })
}

/// Parse and validate config from a YAML string, after `$env{}` expansion.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    // Commented-out lines never reach the parsed config
    let mut unexpanded_vars: Vec<String> = yaml_string
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| env_var_pattern().captures_iter(line))
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables (e.g., export KAFKA_BROKERS=localhost:9092)\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn expand_paths(config: &mut Config) {
    if let Some(dir) = config.web.assets_dir.as_mut() {
        *dir = expand_tilde(dir);
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.kafka.brokers.is_empty() {
        errors.push("kafka.brokers must contain at least one broker".to_string());
    }
    for (i, broker) in config.kafka.brokers.iter().enumerate() {
        if broker.trim().is_empty() {
            errors.push(format!("kafka.brokers[{}]: broker address cannot be empty", i));
        }
    }
    if config.kafka.connect_retries == 0 {
        errors.push("kafka.connect_retries must be at least 1".to_string());
    }

    if let Some(registry) = &config.schema_registry {
        match reqwest::Url::parse(&registry.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "schema_registry.url: unsupported scheme '{}', expected http or https",
                url.scheme()
            )),
            Err(e) => errors.push(format!("schema_registry.url: invalid URL '{}': {}", registry.url, e)),
        }
    }

    if config.fetch.default_limit == 0 {
        errors.push("fetch.default_limit must be greater than 0".to_string());
    }
    if config.fetch.timeout.is_zero() {
        errors.push("fetch.timeout must be greater than 0".to_string());
    }
    if config.fetch.cross_topic_timeout.is_zero() {
        errors.push("fetch.cross_topic_timeout must be greater than 0".to_string());
    }
    if config.fetch.group_prefix.is_empty() {
        errors.push("fetch.group_prefix cannot be empty".to_string());
    }

    if config.cleanup.max_attempts == 0 {
        errors.push("cleanup.max_attempts must be at least 1".to_string());
    }

    if let Err(e) = config.web.listen.parse::<SocketAddr>() {
        errors.push(format!("web.listen: invalid address '{}': {}", config.web.listen, e));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
