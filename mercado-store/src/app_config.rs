use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Upper bound on outbound provider calls, in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_provider_timeout_ms() -> u64 {
    10_000
}

/// Credential sections per provider. A missing section means the provider is
/// registered but disabled; no environment sniffing anywhere else.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub stripe: Option<StripeCredentials>,
    #[serde(default)]
    pub paypal: Option<PaypalCredentials>,
    #[serde(default)]
    pub mercadopago: Option<MercadoPagoCredentials>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeCredentials {
    pub secret_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaypalCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub sandbox: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MercadoPagoCredentials {
    pub access_token: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("MERCADO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
