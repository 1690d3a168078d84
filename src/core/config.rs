use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub registry_server_config: RegistryWebServer,
    pub supabase: SupabaseConfig,
    pub bootstrap_admin: BootstrapAdminConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir().map_err(|e| {
            config::ConfigError::Message(format!("Failed to find the current dir: {}", e))
        })?;
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("STUDENT_REGISTRY_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            // e.g. `STUDENT_REGISTRY__SUPABASE__ANON_KEY=...`
            .add_source(
                config::Environment::with_prefix("STUDENT_REGISTRY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        configurations.try_deserialize()
    }
}

#[derive(Deserialize, Clone)]
pub struct RegistryWebServer {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: Secret<String>,
    pub service_role_key: Option<Secret<String>>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl SupabaseConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }

    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }

    /// The key used for admin identity calls; falls back to the anon key when
    /// no service role key is configured.
    pub fn admin_key(&self) -> &str {
        self.service_role_key
            .as_ref()
            .unwrap_or(&self.anon_key)
            .expose_secret()
    }
}

fn default_request_timeout_secs() -> u64 {
    5
}

#[derive(Deserialize, Clone)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: Secret<String>,
    pub full_name: String,
}

pub enum Environment {
    Local,
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local`, `sandbox` or `production` ",
                other
            )),
        }
    }
}
