use anyhow::{anyhow, Result};
use tilth_core::error::CoreError;
use uuid::Uuid;

use crate::config::Config;

/// Parses a full task, series, plan or planting id.
pub fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim())
        .map_err(|_| anyhow!(CoreError::InvalidInput(format!("'{}' is not a valid ID", id))))
}

pub fn parse_optional_id(id: Option<&str>) -> Result<Option<Uuid>> {
    id.map(parse_id).transpose()
}

/// The `--plan` flag wins over the configured default plan.
pub fn resolve_plan_id(flag: Option<&str>, config: &Config) -> Result<Uuid> {
    Ok(parse_optional_id(flag)?.unwrap_or(config.default_plan_id))
}
