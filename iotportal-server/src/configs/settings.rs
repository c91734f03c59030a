use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::configs::normalize_path;

pub const DEFAULT_AUTH_SECRET: &str = "change-me";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl From<&str> for RunMode {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => RunMode::Production,
            _ => RunMode::Development,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunMode::Development => write!(f, "development"),
            RunMode::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    /// Twins kept in the portal database
    #[default]
    Local,
    Azure,
    Aws,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CloudProvider::Local => write!(f, "local"),
            CloudProvider::Azure => write!(f, "azure"),
            CloudProvider::Aws => write!(f, "aws"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub secret: String,
    pub issuer: Option<String>,
    pub expiration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub name: String,
    pub cloud_provider: CloudProvider,
    pub lorawan_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Azure {
    pub iot_hub_connection_string: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    String::from("2021-04-12")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aws {
    pub access_key: String,
    pub secret_access_key: String,
    pub region: String,
    /// Control plane endpoint, derived from the region when absent
    pub iot_endpoint: Option<String>,
    /// Account specific data plane endpoint (`xxx-ats.iot.<region>.amazonaws.com`)
    pub data_endpoint: String,
}

impl Aws {
    pub fn control_endpoint(&self) -> String {
        self.iot_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://iot.{}.amazonaws.com", self.region))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoRaWan {
    /// Base url of the `<region>.json` router configurations
    pub router_config_url: String,
    /// Base url of the network server facade function
    pub function_url: String,
    pub function_key: Option<String>,
}

impl Default for LoRaWan {
    fn default() -> Self {
        Self {
            router_config_url: String::from("http://localhost:7071/router-config"),
            function_url: String::from("http://localhost:7071"),
            function_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub run_mode: RunMode,
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub auth: Auth,
    pub portal: Portal,
    pub azure: Option<Azure>,
    pub aws: Option<Aws>,
    pub lorawan: Option<LoRaWan>,
    pub metrics: Metrics,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = RunMode::from(env::var("RUN_MODE").unwrap_or("development".into()).as_str());

        Self::from_dir("configs", run_mode)
    }

    pub fn from_dir(dir: &str, run_mode: RunMode) -> Result<Self, ConfigError> {
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(&format!("{dir}/default")))
            .add_source(File::with_name(&format!("{dir}/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("PORTAL").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.run_mode = run_mode;

        if let Some(migrate) = &settings.database.migration_path {
            if Path::new(migrate).is_dir() {
                let migrate_path = normalize_path(migrate)
                    .map_err(|e| ConfigError::Message(e.to_string()))?
                    .to_string_lossy()
                    .to_string();

                settings.database.migration_path = Some(migrate_path);
            } else {
                settings.database.migration_path = None;
            }
        }

        settings.validate()?;

        Ok(settings)
    }

    /// Rejects combinations that cannot serve requests in the current run mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.portal.cloud_provider {
            CloudProvider::Azure => {
                let azure = self.azure.as_ref().ok_or_else(|| {
                    ConfigError::Message("cloud provider azure requires an [azure] section".into())
                })?;

                require_non_empty("azure.iot_hub_connection_string", &azure.iot_hub_connection_string)?;
            }
            CloudProvider::Aws => {
                let aws = self.aws.as_ref().ok_or_else(|| {
                    ConfigError::Message("cloud provider aws requires an [aws] section".into())
                })?;

                require_non_empty("aws.access_key", &aws.access_key)?;
                require_non_empty("aws.secret_access_key", &aws.secret_access_key)?;
                require_non_empty("aws.region", &aws.region)?;
                require_non_empty("aws.data_endpoint", &aws.data_endpoint)?;
            }
            CloudProvider::Local => {}
        }

        if self.portal.lorawan_enabled && self.portal.cloud_provider == CloudProvider::Aws {
            return Err(ConfigError::Message(
                "LoRaWAN features are only available on azure and local providers".into(),
            ));
        }

        if self.run_mode == RunMode::Production {
            if self.auth.secret == DEFAULT_AUTH_SECRET || self.auth.secret.is_empty() {
                return Err(ConfigError::Message(
                    "auth.secret must be set in production".into(),
                ));
            }

            if self.portal.cloud_provider == CloudProvider::Local {
                return Err(ConfigError::Message(
                    "the local registry is not available in production".into(),
                ));
            }

            if self.portal.lorawan_enabled && self.lorawan.is_none() {
                return Err(ConfigError::Message(
                    "LoRaWAN features require a [lorawan] section".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn cloud_provider(&self) -> CloudProvider {
        self.portal.cloud_provider
    }

    pub fn is_lorawan_enabled(&self) -> bool {
        self.portal.lorawan_enabled
    }

    pub fn metrics_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.metrics.refresh_interval_secs.max(1))
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Message(format!("{field} must not be empty")));
    }

    Ok(())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Development,
            server: Server {
                host: String::from("127.0.0.1"),
                port: 8080,
            },
            logger: Logger {
                level: String::from("info"),
            },
            database: Database {
                migration_path: None,
                clean_start: true,
                url: String::from("sqlite::memory:"),
            },
            auth: Auth {
                secret: String::from(DEFAULT_AUTH_SECRET),
                issuer: None,
                expiration: 3600,
            },
            portal: Portal {
                name: String::from("IoT Portal"),
                cloud_provider: CloudProvider::Local,
                lorawan_enabled: true,
            },
            azure: None,
            aws: None,
            lorawan: None,
            metrics: Metrics {
                refresh_interval_secs: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid_in_development() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let mut settings = Settings::default();
        settings.run_mode = RunMode::Production;
        settings.portal.cloud_provider = CloudProvider::Azure;
        settings.azure = Some(Azure {
            iot_hub_connection_string: String::from("HostName=h;SharedAccessKeyName=n;SharedAccessKey=a2V5"),
            api_version: default_api_version(),
        });
        settings.portal.lorawan_enabled = false;

        assert!(settings.validate().is_err());

        settings.auth.secret = String::from("a real secret");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_local_provider() {
        let mut settings = Settings::default();
        settings.run_mode = RunMode::Production;
        settings.auth.secret = String::from("a real secret");
        settings.portal.lorawan_enabled = false;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_provider_section_required() {
        let mut settings = Settings::default();
        settings.portal.cloud_provider = CloudProvider::Aws;
        settings.portal.lorawan_enabled = false;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_azure_connection_string_rejected() {
        let mut settings = Settings::default();
        settings.portal.cloud_provider = CloudProvider::Azure;
        settings.azure = Some(Azure {
            iot_hub_connection_string: String::from("  "),
            api_version: default_api_version(),
        });

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("azure.iot_hub_connection_string"));
    }

    #[test]
    fn test_empty_aws_credentials_rejected() {
        let aws = Aws {
            access_key: String::from("AKID"),
            secret_access_key: String::from("secret"),
            region: String::from("eu-west-1"),
            iot_endpoint: None,
            data_endpoint: String::from("https://example-ats.iot.eu-west-1.amazonaws.com"),
        };

        let mut settings = Settings::default();
        settings.portal.cloud_provider = CloudProvider::Aws;
        settings.portal.lorawan_enabled = false;

        for (field, blank) in [
            ("aws.access_key", Aws { access_key: String::new(), ..aws.clone() }),
            ("aws.secret_access_key", Aws { secret_access_key: String::new(), ..aws.clone() }),
            ("aws.region", Aws { region: String::new(), ..aws.clone() }),
        ] {
            settings.aws = Some(blank);
            let err = settings.validate().unwrap_err();
            assert!(err.to_string().contains(field), "{err}");
        }

        settings.aws = Some(aws);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_lorawan_not_supported_on_aws() {
        let mut settings = Settings::default();
        settings.portal.cloud_provider = CloudProvider::Aws;
        settings.aws = Some(Aws {
            access_key: String::from("AKID"),
            secret_access_key: String::from("secret"),
            region: String::from("eu-west-1"),
            iot_endpoint: None,
            data_endpoint: String::from("https://example-ats.iot.eu-west-1.amazonaws.com"),
        });

        assert!(settings.validate().is_err());

        settings.portal.lorawan_enabled = false;
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.aws.unwrap().control_endpoint(),
            "https://iot.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_run_mode_parsing() {
        assert_eq!(RunMode::from("Production"), RunMode::Production);
        assert_eq!(RunMode::from("anything"), RunMode::Development);
        assert_eq!(RunMode::Production.to_string(), "production");
    }

    #[test]
    fn test_metrics_interval_has_floor() {
        let mut settings = Settings::default();
        settings.metrics.refresh_interval_secs = 0;

        assert_eq!(settings.metrics_refresh_interval(), Duration::from_secs(1));
    }
}
