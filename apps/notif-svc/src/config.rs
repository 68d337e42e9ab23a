use core_config::server::ServerConfig;
use core_config::{env_or_default, ConfigError, Environment, FromEnv};

/// Top-level service configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub nats_url: String,
}

impl FromEnv for Config {
    /// - `APP_ENV`: `development` (default) or `production`
    /// - `HOST` / `PORT`: intake bind address, defaults 0.0.0.0:6969
    /// - `NATS_URL`: broker address, defaults nats://localhost:4222
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            nats_url: env_or_default("NATS_URL", "nats://localhost:4222"),
        })
    }
}
