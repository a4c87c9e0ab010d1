//! Configuration validation.
//!
//! Checks every configured value before any request is made or file is read.

use crate::domain::dashboard::ColumnMap;
use crate::domain::error::DashboardError;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_endpoint(config)?;
    validate_positive(config, "api", "page_size")?;
    validate_positive(config, "api", "timeout_secs")?;
    validate_non_negative(config, "api", "pause_ms")?;
    validate_non_negative(config, "cache", "ttl_secs")?;
    validate_positive(config, "cache", "max_entries")?;
    validate_distinct_columns(config, "columns", &ColumnMap::api_defaults())?;
    validate_distinct_columns(config, "file", &ColumnMap::file_defaults())?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> DashboardError {
    DashboardError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_endpoint(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    match config.get_string("api", "endpoint") {
        None => Ok(()),
        Some(s) if !(s.starts_with("http://") || s.starts_with("https://")) => Err(invalid(
            "api",
            "endpoint",
            "endpoint must start with http:// or https://",
        )),
        Some(_) => Ok(()),
    }
}

/// Missing keys pass (defaults apply); present keys must parse.
fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, DashboardError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("{key} must be an integer"))),
    }
}

fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), DashboardError> {
    match read_int(config, section, key)? {
        Some(v) if v <= 0 => Err(invalid(section, key, &format!("{key} must be positive"))),
        _ => Ok(()),
    }
}

fn validate_non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), DashboardError> {
    match read_int(config, section, key)? {
        Some(v) if v < 0 => Err(invalid(section, key, &format!("{key} must be non-negative"))),
        _ => Ok(()),
    }
}

/// Entity, category and amount columns must name different fields.
fn validate_distinct_columns(
    config: &dyn ConfigPort,
    section: &str,
    defaults: &ColumnMap,
) -> Result<(), DashboardError> {
    let mut keys = vec![
        ("entity", defaults.entity.as_str()),
        ("assets", defaults.assets.as_str()),
        ("liabilities", defaults.liabilities.as_str()),
    ];
    if let Some(category) = defaults.category.as_deref() {
        keys.push(("category", category));
    }

    let mut seen: Vec<(&str, String)> = Vec::new();
    for (key, default) in keys {
        let column = config
            .get_string(section, key)
            .unwrap_or_else(|| default.to_string());
        if let Some((other, _)) = seen.iter().find(|(_, c)| *c == column) {
            return Err(invalid(
                section,
                key,
                &format!("column {column} is already used for {other}"),
            ));
        }
        seen.push((key, column));
    }
    Ok(())
}
