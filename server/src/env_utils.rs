use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result};

pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be a boolean, got '{raw}'"),
    }
}

/// Parses `key` as `T`, falling back to `default` when the variable is unset.
pub(crate) fn parse_env<T>(key: &str, default: T, expected: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .map_err(|error| anyhow::anyhow!("{error}"))
        .with_context(|| format!("{key} must be {expected}, got '{raw}'"))
}
