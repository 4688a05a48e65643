//! Write a single attribute.

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use crate::config::Config;

pub async fn execute(attribute: &str, value: &str, config: &Config) -> Result<()> {
    let root = super::discover(config).await?;
    let value = parse_value(value);

    root.find_attribute(attribute)?.put(&value).await?;
    println!("{} {} = {}", "✓".green(), attribute, value);
    Ok(())
}

/// Parse a command line value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
