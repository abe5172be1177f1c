// clinic_shop/src/config.rs

use crate::errors::{AppError, Result};
use crate::pricing::PricingPolicy;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,
  pub log_format: LogFormat,
  pub pricing: PricingPolicy,
}

impl AppConfig {
  /// Reads the process environment, after loading `.env` if one exists.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the process
  /// environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&lookup, "SERVER_PORT", 8080_u16)?;
    let database_url = lookup("DATABASE_URL")
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;
    let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5_u32)?;
    let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", false)?;
    let log_format = parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;

    let defaults = PricingPolicy::default();
    let pricing = PricingPolicy {
      tax_rate_basis_points: parse_or(&lookup, "TAX_RATE_BASIS_POINTS", defaults.tax_rate_basis_points)?,
      flat_shipping_cents: parse_or(&lookup, "FLAT_SHIPPING_CENTS", defaults.flat_shipping_cents)?,
      free_shipping_threshold_cents: parse_or(
        &lookup,
        "FREE_SHIPPING_THRESHOLD_CENTS",
        defaults.free_shipping_threshold_cents,
      )?,
    };
    if pricing.tax_rate_basis_points < 0 || pricing.flat_shipping_cents < 0 || pricing.free_shipping_threshold_cents < 0
    {
      return Err(AppError::Config("Pricing overrides must not be negative".to_string()));
    }
    if database_max_connections == 0 {
      return Err(AppError::Config("DATABASE_MAX_CONNECTIONS must be at least 1".to_string()));
    }

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      log_format,
      pricing,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(name) {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
  }
}
