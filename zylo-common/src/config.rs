//! Configuration loading and resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority; clap also maps these from env)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file never prevents startup. A malformed one does.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Minimum accepted length for the token signing secret
pub const MIN_JWT_SECRET_LEN: usize = 16;

/// Default access token lifetime (7 days)
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 168;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Values accepted as "on" for boolean flags and form fields
const TRUTHY: [&str; 5] = ["1", "true", "yes", "y", "on"];
/// Values accepted as "off"
const FALSY: [&str; 5] = ["0", "false", "no", "n", "off"];

/// Parse a loose boolean flag (`yes`, `on`, `0`, ...)
///
/// Returns `None` when the value is not a recognised boolean spelling.
pub fn parse_flag(value: &str) -> Option<bool> {
    let v = value.trim().to_lowercase();
    if TRUTHY.contains(&v.as_str()) {
        Some(true)
    } else if FALSY.contains(&v.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// True only for an explicitly truthy value
pub fn is_truthy(value: Option<&str>) -> bool {
    value.and_then(parse_flag).unwrap_or(false)
}

/// Detect unset or template credential values (`xxxxx`, `changeme`, ...)
pub fn is_placeholder(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "" | "xxxx" | "xxxxx" | "changeme" | "change_me"
    )
}

/// Whether an ADMIN may upload mixes
///
/// An explicit truthy flag always allows it. Otherwise uploads are allowed
/// outside production unless the flag explicitly turns them off.
pub fn admin_upload_allowed(flag: Option<&str>, environment: &str) -> bool {
    let parsed = flag.and_then(parse_flag);
    if parsed == Some(true) {
        return true;
    }
    environment.trim().to_lowercase() != "production" && parsed != Some(false)
}

// ========================================
// TOML file
// ========================================

/// On-disk TOML configuration (all keys optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub environment: Option<String>,
    pub allow_admin_upload: Option<String>,
    #[serde(default)]
    pub jwt: JwtSection,
    #[serde(default)]
    pub admin: AdminSection,
    #[serde(default)]
    pub cloudinary: CloudinarySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtSection {
    pub secret: Option<String>,
    pub expiry_hours: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSection {
    pub auto_seed: Option<bool>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudinarySection {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub upload_preset: Option<String>,
}

/// Platform config file location (`~/.config/zylofm/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zylofm").join("config.toml"))
}

/// Platform default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("zylofm"))
        .unwrap_or_else(|| PathBuf::from("./zylofm_data"))
        .join("zylofm.db")
}

/// Load the TOML config file
///
/// Missing files produce a warning and an empty config.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

// ========================================
// Resolved configuration
// ========================================

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AdminSeedConfig {
    pub enabled: bool,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: Option<String>,
}

impl CloudinaryConfig {
    /// All three credentials present and not template values
    pub fn is_configured(&self) -> bool {
        !is_placeholder(&self.cloud_name)
            && !is_placeholder(&self.api_key)
            && !is_placeholder(&self.api_secret)
    }

    /// The upload preset, unless unset or a template value
    pub fn preset(&self) -> Option<&str> {
        self.upload_preset
            .as_deref()
            .filter(|p| !is_placeholder(p))
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub environment: String,
    pub allow_admin_upload: bool,
    pub jwt: JwtConfig,
    pub admin_seed: AdminSeedConfig,
    pub cloudinary: CloudinaryConfig,
}

impl ServiceConfig {
    /// Resolve from CLI overrides, the process environment and a TOML file
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        Self::resolve_with(overrides, toml, |key| std::env::var(key).ok())
    }

    /// Resolve using an explicit environment lookup
    pub fn resolve_with<F>(overrides: ConfigOverrides, toml: TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = overrides
            .bind_addr
            .or_else(|| env_str("ZYLO_BIND"))
            .or(toml.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let port = match overrides.port {
            Some(p) => p,
            None => match env_str("PORT") {
                Some(raw) => raw
                    .parse::<u16>()
                    .map_err(|e| Error::Config(format!("Invalid PORT '{}': {}", raw, e)))?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let database_path = overrides
            .database_path
            .or_else(|| env_str("ZYLO_DATABASE").map(PathBuf::from))
            .or(toml.database_path)
            .unwrap_or_else(default_database_path);

        let environment = env_str("ZYLO_ENV")
            .or(toml.environment)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let upload_flag = env_str("ALLOW_ADMIN_UPLOAD").or(toml.allow_admin_upload);
        let allow_admin_upload = admin_upload_allowed(upload_flag.as_deref(), &environment);

        let secret = env_str("JWT_SECRET")
            .or(toml.jwt.secret)
            .unwrap_or_default();
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(Error::Config(format!(
                "JWT_SECRET is missing or too short (min {} chars). Set it to a long random string.",
                MIN_JWT_SECRET_LEN
            )));
        }

        let expiry_hours = match env_str("JWT_EXPIRY_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| Error::Config(format!("Invalid JWT_EXPIRY_HOURS '{}': {}", raw, e)))?,
            None => toml.jwt.expiry_hours.unwrap_or(DEFAULT_JWT_EXPIRY_HOURS),
        };
        if expiry_hours <= 0 {
            return Err(Error::Config("JWT expiry must be positive".to_string()));
        }

        let admin_seed = AdminSeedConfig {
            enabled: match env_str("AUTO_SEED_ADMIN") {
                Some(v) => is_truthy(Some(&v)),
                None => toml.admin.auto_seed.unwrap_or(false),
            },
            email: env_str("ADMIN_EMAIL").or(toml.admin.email),
            password: env("ADMIN_PASSWORD")
                .filter(|p| !p.is_empty())
                .or(toml.admin.password),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: env_str("CLOUDINARY_CLOUD_NAME")
                .or(toml.cloudinary.cloud_name)
                .unwrap_or_default(),
            api_key: env_str("CLOUDINARY_API_KEY")
                .or(toml.cloudinary.api_key)
                .unwrap_or_default(),
            api_secret: env_str("CLOUDINARY_API_SECRET")
                .or(toml.cloudinary.api_secret)
                .unwrap_or_default(),
            upload_preset: env_str("CLOUDINARY_UPLOAD_PRESET").or(toml.cloudinary.upload_preset),
        };

        Ok(Self {
            bind_addr,
            port,
            database_path,
            environment,
            allow_admin_upload,
            jwt: JwtConfig {
                secret,
                expiry_hours,
            },
            admin_seed,
            cloudinary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRET: &str = "0123456789abcdef0123";

    #[test]
    fn test_parse_flag_spellings() {
        for v in ["1", "true", "YES", " y ", "On"] {
            assert_eq!(parse_flag(v), Some(true), "{v}");
        }
        for v in ["0", "false", "No", "n", "OFF"] {
            assert_eq!(parse_flag(v), Some(false), "{v}");
        }
        assert_eq!(parse_flag("maybe"), None);
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder(" XXXXX "));
        assert!(is_placeholder("change_me"));
        assert!(!is_placeholder("my-cloud"));
    }

    #[test]
    fn test_admin_upload_rules() {
        assert!(admin_upload_allowed(None, "development"));
        assert!(!admin_upload_allowed(None, "production"));
        assert!(admin_upload_allowed(Some("true"), "production"));
        assert!(!admin_upload_allowed(Some("off"), "development"));
        assert!(admin_upload_allowed(Some("garbage"), "development"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = ServiceConfig::resolve_with(
            ConfigOverrides::default(),
            TomlConfig::default(),
            env_of(&[("JWT_SECRET", SECRET)]),
        )
        .unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.environment, DEFAULT_ENVIRONMENT);
        assert_eq!(config.jwt.expiry_hours, DEFAULT_JWT_EXPIRY_HOURS);
        assert!(config.allow_admin_upload);
        assert!(!config.admin_seed.enabled);
        assert!(!config.cloudinary.is_configured());
    }

    #[test]
    fn test_missing_or_short_secret_rejected() {
        let missing = ServiceConfig::resolve_with(
            ConfigOverrides::default(),
            TomlConfig::default(),
            env_of(&[]),
        );
        assert!(matches!(missing, Err(Error::Config(_))));

        let short = ServiceConfig::resolve_with(
            ConfigOverrides::default(),
            TomlConfig::default(),
            env_of(&[("JWT_SECRET", "short")]),
        );
        assert!(matches!(short, Err(Error::Config(_))));
    }

    #[test]
    fn test_priority_cli_over_env_over_toml() {
        let toml = TomlConfig {
            port: Some(4000),
            bind_addr: Some("10.0.0.1".to_string()),
            database_path: Some(PathBuf::from("/toml/db.sqlite")),
            ..Default::default()
        };

        let config = ServiceConfig::resolve_with(
            ConfigOverrides {
                port: Some(5000),
                ..Default::default()
            },
            toml,
            env_of(&[
                ("JWT_SECRET", SECRET),
                ("PORT", "4500"),
                ("ZYLO_BIND", "0.0.0.0"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.database_path, PathBuf::from("/toml/db.sqlite"));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = ServiceConfig::resolve_with(
            ConfigOverrides::default(),
            TomlConfig::default(),
            env_of(&[("JWT_SECRET", SECRET), ("PORT", "http")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cloudinary_preset_placeholder_ignored() {
        let config = ServiceConfig::resolve_with(
            ConfigOverrides::default(),
            TomlConfig::default(),
            env_of(&[
                ("JWT_SECRET", SECRET),
                ("CLOUDINARY_CLOUD_NAME", "zylo"),
                ("CLOUDINARY_API_KEY", "key"),
                ("CLOUDINARY_API_SECRET", "secret"),
                ("CLOUDINARY_UPLOAD_PRESET", "xxxx"),
            ]),
        )
        .unwrap();

        assert!(config.cloudinary.is_configured());
        assert_eq!(config.cloudinary.preset(), None);
    }
}
