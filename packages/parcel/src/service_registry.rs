//! Compile-time registry of upstream service configurations.
//!
//! Each deployment is defined in a TOML file under `services/`. The
//! registry embeds these at compile time; an alternative file can be
//! supplied at runtime via `PARCEL_SERVICES_CONFIG`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parcel_map_parcel_models::config::{HttpConfig, ServiceConfig};
use thiserror::Error;

/// Environment variable naming an alternative service TOML file.
pub const CONFIG_ENV_VAR: &str = "PARCEL_SERVICES_CONFIG";

/// Deployment used when no override is given.
pub const DEFAULT_SERVICE_ID: &str = "maine";

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[("maine", include_str!("../services/maine.toml"))];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Errors loading a service configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for a [`ServiceConfig`].
    #[error("Invalid service config: {0}")]
    Toml(#[from] toml::de::Error),

    /// No embedded deployment has this ID.
    #[error("Unknown service '{id}'")]
    UnknownService {
        /// The requested ID.
        id: String,
    },
}

/// Returns all embedded service configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<ServiceConfig> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse parcel service '{name}': {e}"))
        })
        .collect()
}

/// Returns the embedded configuration with the given ID.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownService`] if no embedded config has
/// that ID.
pub fn service(id: &str) -> Result<ServiceConfig, RegistryError> {
    all_services()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| RegistryError::UnknownService { id: id.to_string() })
}

/// Loads a service configuration from a TOML file.
///
/// # Errors
///
/// Returns [`RegistryError`] if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> Result<ServiceConfig, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::de::from_str(&contents)?)
}

/// Loads the file named by `PARCEL_SERVICES_CONFIG`, or the default
/// embedded deployment when it is unset.
///
/// # Errors
///
/// Returns [`RegistryError`] if the override file cannot be loaded.
pub fn from_env() -> Result<ServiceConfig, RegistryError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            log::info!("Loading parcel services from {path}");
            load_from_file(Path::new(path.trim()))
        }
        _ => service(DEFAULT_SERVICE_ID),
    }
}

/// Builds the shared outbound HTTP client.
///
/// Request timeouts are set per call by each upstream client; this only
/// bounds the idle pool and connection setup.
///
/// # Errors
///
/// Returns [`reqwest::Error`] if the TLS backend cannot be initialized.
pub fn build_http_client(http: &HttpConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .user_agent(http.user_agent.as_str())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_map_parcel_models::config::DisambiguationConfig;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(!svc.default_state.is_empty(), "Service {} has no state", svc.id);
            assert!(!svc.locator.url.is_empty(), "Service {} has no locator", svc.id);
            assert!(!svc.parcels.url.is_empty(), "Service {} has no parcels", svc.id);
            assert!(!svc.zoning.url.is_empty(), "Service {} has no zoning", svc.id);
        }
    }

    #[test]
    fn maine_defaults() {
        let maine = service(DEFAULT_SERVICE_ID).unwrap();
        assert_eq!(maine.default_state, "Maine");
        assert_eq!(maine.locator.wkid, 26919);
        assert_eq!(maine.locator.timeout_secs, 10);
        assert_eq!(maine.parcels.timeout_secs, 15);
        assert_eq!(maine.zoning.timeout_secs, 10);
        assert_eq!(maine.disambiguation, DisambiguationConfig::StreetName);
        assert_eq!(maine.search.town_max_records, 50);
    }

    #[test]
    fn unknown_service() {
        assert!(matches!(
            service("atlantis"),
            Err(RegistryError::UnknownService { .. })
        ));
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg: ServiceConfig = toml::de::from_str(
            r#"
            id = "test"
            name = "Test"
            default_state = "Vermont"

            [locator]
            url = "http://locator.test"

            [parcels]
            url = "http://parcels.test"

            [zoning]
            url = "http://zoning.test"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.locator.wkid, 26919);
        assert_eq!(cfg.parcels.timeout_secs, 15);
        assert_eq!(cfg.zoning.envelope_wkid, 4326);
        assert_eq!(cfg.search.zoning_max_records, 10);
        assert_eq!(cfg.http.pool_max_idle_per_host, 16);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_from_file(Path::new("/nonexistent/parcel-services.toml")),
            Err(RegistryError::Io { .. })
        ));
    }

    #[test]
    fn builds_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }
}
