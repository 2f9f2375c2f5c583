use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use pks_common::Secret;
use rand::{distributions::Alphanumeric, Rng};

const DEFAULT_PKS_HOST: &str = "127.0.0.1";
const DEFAULT_PKS_PORT: u16 = 8460;
/// How often the sweeper wakes up.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
/// How long an unpaid booking survives before the sweeper reclaims it.
const DEFAULT_PAYMENT_GRACE_MINS: i64 = 60;
/// How long the pending-payment lookup will wait for correlation data before giving up.
const DEFAULT_PAYMENT_WAIT_SECS: u64 = 15;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 128;
const DEFAULT_ACCESS_TOKEN_MINS: i64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The interval between sweeper runs.
    pub sweep_interval: StdDuration,
    /// The time a booking may remain unpaid before the sweeper reclaims its spot.
    pub payment_grace: Duration,
    /// The bounded wait applied when the payment agent asks for a user's pending invoice.
    pub payment_wait: StdDuration,
    /// Buffer size of the payment-request event channel.
    pub event_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PKS_HOST.to_string(),
            port: DEFAULT_PKS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            sweep_interval: StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            payment_grace: Duration::minutes(DEFAULT_PAYMENT_GRACE_MINS),
            payment_wait: StdDuration::from_secs(DEFAULT_PAYMENT_WAIT_SECS),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PKS_HOST").ok().unwrap_or_else(|| DEFAULT_PKS_HOST.into());
        let port = env::var("PKS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PKS_PORT. {e} Using the default, {DEFAULT_PKS_PORT}, instead."
                    );
                    DEFAULT_PKS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PKS_PORT);
        let database_url = env::var("PKS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PKS_DATABASE_URL is not set. Please set it to the URL for the Parkside database.");
            String::default()
        });
        let auth = AuthConfig::from_env_or_default();
        let sweep_interval = parse_u64_env("PKS_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
        let payment_grace = parse_i64_env("PKS_PAYMENT_GRACE_MINS", DEFAULT_PAYMENT_GRACE_MINS);
        let payment_wait = parse_u64_env("PKS_PAYMENT_WAIT_SECS", DEFAULT_PAYMENT_WAIT_SECS);
        Self {
            host,
            port,
            database_url,
            auth,
            sweep_interval: StdDuration::from_secs(sweep_interval),
            payment_grace: Duration::minutes(payment_grace),
            payment_wait: StdDuration::from_secs(payment_wait),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HS256 secret for the access tokens this server issues.
    pub jwt_secret: Secret<String>,
    /// Shared secret for validating login tokens from the credential module. Usually the same secret.
    pub login_secret: Secret<String>,
    pub access_token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret = random_secret();
        Self {
            jwt_secret: Secret::new(secret.clone()),
            login_secret: Secret::new(secret),
            access_token_lifetime: Duration::minutes(DEFAULT_ACCESS_TOKEN_MINS),
        }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = match env::var("PKS_JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!(
                    "🪛️ PKS_JWT_SECRET is not set. Generating a random secret; issued tokens will not survive a \
                     restart."
                );
                random_secret()
            },
        };
        let login_secret = env::var("PKS_LOGIN_SECRET").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            info!("🪛️ PKS_LOGIN_SECRET is not set. Using PKS_JWT_SECRET for login tokens as well.");
            jwt_secret.clone()
        });
        let lifetime = parse_i64_env("PKS_ACCESS_TOKEN_MINS", DEFAULT_ACCESS_TOKEN_MINS);
        Self {
            jwt_secret: Secret::new(jwt_secret),
            login_secret: Secret::new(login_secret),
            access_token_lifetime: Duration::minutes(lifetime),
        }
    }
}

fn random_secret() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
}

fn parse_u64_env(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .map(|s| {
            s.parse::<u64>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .unwrap_or(default)
}

fn parse_i64_env(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .map(|s| {
            s.parse::<i64>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8460);
        assert_eq!(config.sweep_interval, StdDuration::from_secs(300));
        assert_eq!(config.payment_grace, Duration::minutes(60));
        assert_eq!(config.payment_wait, StdDuration::from_secs(15));
    }

    #[test]
    fn secrets_do_not_leak_via_debug() {
        let config = AuthConfig::default();
        let printed = format!("{config:?}");
        assert!(!printed.contains(config.jwt_secret.reveal()));
    }
}
