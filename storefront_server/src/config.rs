use std::{env, io::Write};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use sf_common::{helpers::parse_boolean_flag, Secret};
use storefront_engine::sf_api::payment_api::DEFAULT_PAYMENT_SUCCESS_RATE;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_EXPIRY: Duration = Duration::hours(24);
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the embedded database migrations are applied at startup.
    pub run_migrations: bool,
    pub auth: AuthConfig,
    /// The probability that the simulated payment processor approves a charge.
    pub payment_success_rate: f64,
    /// Accounts registered with one of these email addresses are given the admin role.
    pub admin_emails: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            auth: AuthConfig::default(),
            payment_success_rate: DEFAULT_PAYMENT_SUCCESS_RATE,
            admin_emails: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SF_HOST").ok().unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = env::var("SF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for SF_PORT. {e} Using the default, {DEFAULT_SF_PORT}, instead.");
                    DEFAULT_SF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SF_PORT);
        let database_url = env::var("SF_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ SF_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env::var("SF_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| {
                        warn!("🪛️ Invalid configuration value for SF_DB_MAX_CONNECTIONS: {s}");
                        None
                    })
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("SF_RUN_MIGRATIONS").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let payment_success_rate = configure_payment_success_rate();
        let admin_emails = env::var("SF_ADMIN_EMAILS").map(|s| parse_admin_emails(&s)).unwrap_or_default();
        if admin_emails.is_empty() {
            info!("🪛️ SF_ADMIN_EMAILS is not set. Nobody can register as an administrator.");
        }
        Self { host, port, database_url, max_connections, run_migrations, auth, payment_success_rate, admin_emails }
    }
}

fn configure_payment_success_rate() -> f64 {
    env::var("SF_PAYMENT_SUCCESS_RATE")
        .map_err(|_| {
            debug!(
                "🪛️ SF_PAYMENT_SUCCESS_RATE is not set. Using the default value of {DEFAULT_PAYMENT_SUCCESS_RATE}."
            )
        })
        .and_then(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|r| (0.0..=1.0).contains(r))
                .ok_or_else(|| warn!("🪛️ SF_PAYMENT_SUCCESS_RATE must be a number between 0 and 1, but was {s}."))
        })
        .ok()
        .unwrap_or(DEFAULT_PAYMENT_SUCCESS_RATE)
}

pub fn parse_admin_emails(s: &str) -> Vec<String> {
    s.split(',').map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()).collect()
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
    /// How long an access token remains valid after it is issued.
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since all access tokens become invalid when the server restarts. 🚨️🚨️🚨️"
        );
        let secret: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the SF_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_expiry: DEFAULT_TOKEN_EXPIRY }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, token_expiry: Duration) -> Result<Self, ServerError> {
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "The JWT secret must be at least {MIN_JWT_SECRET_LENGTH} bytes long"
            )));
        }
        if token_expiry <= Duration::zero() {
            return Err(ServerError::ConfigurationError("The token expiry must be positive".to_string()));
        }
        Ok(Self { jwt_secret: Secret::new(jwt_secret.to_string()), token_expiry })
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SF_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SF_JWT_SECRET]")))?;
        let token_expiry = match env::var("SF_JWT_EXPIRY_HOURS") {
            Ok(s) => s.parse::<i64>().map(Duration::hours).map_err(|e| {
                ServerError::ConfigurationError(format!("Invalid value for SF_JWT_EXPIRY_HOURS: {s}. {e}"))
            })?,
            Err(_) => DEFAULT_TOKEN_EXPIRY,
        };
        Self::new(&secret, token_expiry)
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub admin_emails: Vec<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { admin_emails: config.admin_emails.clone() }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}
