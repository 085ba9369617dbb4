use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::ConnectParams;
use crate::errors::ConfigError;
use crate::routing::{RoutingKey, RoutingTable, SenderId};

pub const CONFIG_ENV_VAR: &str = "DTP_INGEST_CONFIG";

/// Static ingestion configuration: one entry per location, each carrying the
/// database endpoint for that location and the routing tree that maps
/// data type and tester type to a sender id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    pub locations: BTreeMap<String, LocationConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    pub hostname: String,
    pub port: u16,
    pub service_name: String,
    /// Names of the environment variables holding the credentials. Default:
    /// `{LOCATION}_DB_USERNAME` / `{LOCATION}_DB_PASSWORD`.
    #[serde(default)]
    pub username_env: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
    pub data_types: BTreeMap<String, DataTypeRoutes>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataTypeRoutes {
    pub tester_types: BTreeMap<String, SenderId>,
}

impl IngestConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let config: IngestConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let content = std::env::var(CONFIG_ENV_VAR).map_err(|_| ConfigError::Load {
            path: CONFIG_ENV_VAR.to_string(),
            reason: "environment variable not set".to_string(),
        })?;
        let config: IngestConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid {
                message: "at least one location must be configured".to_string(),
            });
        }
        for (name, location) in &self.locations {
            if location.hostname.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("location {name}: hostname cannot be empty"),
                });
            }
            if location.port == 0 {
                return Err(ConfigError::Invalid {
                    message: format!("location {name}: port cannot be zero"),
                });
            }
            if location.service_name.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("location {name}: service name cannot be empty"),
                });
            }
            if location.data_types.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("location {name}: at least one data type must be configured"),
                });
            }
            for (data_type, routes) in &location.data_types {
                if routes.tester_types.is_empty() {
                    return Err(ConfigError::Invalid {
                        message: format!(
                            "location {name}, data type {data_type}: at least one tester type must be configured"
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn location(&self, name: &str) -> Result<&LocationConfig, ConfigError> {
        self.locations
            .get(name)
            .ok_or_else(|| ConfigError::UnknownLocation {
                location: name.to_string(),
            })
    }

    /// Flattens the per-location routing trees into one three-level table.
    pub fn routing_table(&self) -> RoutingTable {
        let mut table = RoutingTable::new();
        for (location, location_config) in &self.locations {
            for (data_type, routes) in &location_config.data_types {
                for (tester_type, sender_id) in &routes.tester_types {
                    table.insert(
                        RoutingKey::new(location.clone(), data_type.clone(), tester_type.clone()),
                        *sender_id,
                    );
                }
            }
        }
        table
    }
}

impl LocationConfig {
    /// Resolves the connection parameters for this location, reading the
    /// credentials from the environment at request time.
    pub fn connect_params(&self, location_name: &str) -> Result<ConnectParams, ConfigError> {
        let username_var = self
            .username_env
            .clone()
            .unwrap_or_else(|| format!("{location_name}_DB_USERNAME"));
        let password_var = self
            .password_env
            .clone()
            .unwrap_or_else(|| format!("{location_name}_DB_PASSWORD"));

        let username = read_credential(&username_var)?;
        let password = read_credential(&password_var)?;

        Ok(ConnectParams {
            hostname: self.hostname.clone(),
            port: self.port,
            service_name: self.service_name.clone(),
            username,
            password,
        })
    }
}

fn read_credential(var: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential {
            var: var.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_YAML: &str = r#"
locations:
  KR1:
    hostname: "kr1-db.example.com"
    port: 1521
    service_name: "DTPKR1"
    data_types:
      WAFER:
        tester_types:
          ETEST: 4102
          FINAL: 4103
      LOT:
        tester_types:
          ETEST: 4201
  US2:
    hostname: "us2-db.example.com"
    port: 1522
    service_name: "DTPUS2"
    username_env: "US2_ORA_USER"
    password_env: "US2_ORA_PASS"
    data_types:
      WAFER:
        tester_types:
          SORT: 7001
"#;

    fn sample_config() -> IngestConfig {
        serde_yaml::from_str(SAMPLE_YAML).unwrap()
    }

    #[test]
    fn test_config_from_yaml_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(SAMPLE_YAML.as_bytes()).unwrap();

        let config = IngestConfig::from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.locations["KR1"].port, 1521);
        assert_eq!(
            config.locations["KR1"].data_types["WAFER"].tester_types["ETEST"],
            SenderId(4102)
        );
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = IngestConfig::from_file("/nonexistent/dtp-info-config.yaml");
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn test_config_from_malformed_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"locations: [not, a, map").unwrap();

        let result = IngestConfig::from_file(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_locations() {
        let config = IngestConfig {
            locations: BTreeMap::new(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one location"));
    }

    #[test]
    fn test_validate_rejects_empty_hostname() {
        let mut config = sample_config();
        config.locations.get_mut("KR1").unwrap().hostname = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hostname cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_empty_tester_types() {
        let mut config = sample_config();
        config
            .locations
            .get_mut("KR1")
            .unwrap()
            .data_types
            .get_mut("WAFER")
            .unwrap()
            .tester_types
            .clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tester type"));
    }

    #[test]
    fn test_location_lookup() {
        let config = sample_config();
        assert!(config.location("KR1").is_ok());
        let err = config.location("JP9").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLocation { .. }));
    }

    #[test]
    fn test_routing_table_from_config() {
        let table = sample_config().routing_table();
        let id = table
            .resolve(&RoutingKey::new("US2", "WAFER", "SORT"))
            .unwrap();
        assert_eq!(id, SenderId(7001));
        assert!(
            table
                .resolve(&RoutingKey::new("US2", "WAFER", "ETEST"))
                .is_err()
        );
    }

    #[test]
    fn test_connect_params_with_default_env_names() {
        unsafe {
            std::env::set_var("KR1_DB_USERNAME", "kr1app");
            std::env::set_var("KR1_DB_PASSWORD", "kr1secret");
        }

        let config = sample_config();
        let params = config.locations["KR1"].connect_params("KR1").unwrap();
        assert_eq!(params.username, "kr1app");
        assert_eq!(params.password, "kr1secret");
        assert_eq!(params.connect_string(), "kr1-db.example.com:1521/DTPKR1");

        unsafe {
            std::env::remove_var("KR1_DB_USERNAME");
            std::env::remove_var("KR1_DB_PASSWORD");
        }
    }

    #[test]
    fn test_connect_params_with_named_env_vars() {
        unsafe {
            std::env::set_var("US2_ORA_USER", "us2app");
            std::env::set_var("US2_ORA_PASS", "us2secret");
        }

        let config = sample_config();
        let params = config.locations["US2"].connect_params("US2").unwrap();
        assert_eq!(params.username, "us2app");
        assert_eq!(params.connect_string(), "us2-db.example.com:1522/DTPUS2");

        unsafe {
            std::env::remove_var("US2_ORA_USER");
            std::env::remove_var("US2_ORA_PASS");
        }
    }

    #[test]
    fn test_connect_params_missing_credentials() {
        unsafe {
            std::env::remove_var("JP9_DB_USERNAME");
            std::env::remove_var("JP9_DB_PASSWORD");
        }

        let location = LocationConfig {
            hostname: "jp9-db.example.com".to_string(),
            port: 1521,
            service_name: "DTPJP9".to_string(),
            username_env: None,
            password_env: None,
            data_types: BTreeMap::new(),
        };
        let err = location.connect_params("JP9").unwrap_err();
        match err {
            ConfigError::MissingCredential { var } => assert_eq!(var, "JP9_DB_USERNAME"),
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }
}
