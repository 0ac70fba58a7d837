use std::{env, str::FromStr};

/// Read an environment variable, falling back to `default` when it is
/// absent or unparsable. Unparsable values are logged rather than fatal.
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("could not parse {name}={raw}, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub psp: PspConfig,
    pub reconciler: ReconcilerConfig,
}

#[derive(Debug, Clone)]
pub struct PspConfig {
    pub base_url: String,
    pub callback_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub sweep_interval_secs: u64,
    /// How long a transaction may sit in PROCESSING before a sweep
    /// considers it stale and polls the provider for a verdict.
    pub staleness_secs: i64,
    pub batch_size: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            psp: PspConfig {
                base_url: env_or("PSP_BASE_URL", "http://127.0.0.1:3000/mock-psp".to_string()),
                callback_url: env_or(
                    "PSP_CALLBACK_URL",
                    "http://127.0.0.1:3000/webhooks/psp".to_string(),
                ),
                timeout_secs: env_or("PSP_TIMEOUT_SECS", 5),
            },
            reconciler: ReconcilerConfig {
                sweep_interval_secs: env_or("RECONCILE_INTERVAL_SECS", 30),
                staleness_secs: env_or("RECONCILE_STALENESS_SECS", 60),
                batch_size: env_or("RECONCILE_BATCH_SIZE", 100),
            },
        }
    }
}
