//! Process configuration loaded from environment variables.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use common::ReplicaId;
use executor::{FaultInjection, RingConfig};
use payment::DEFAULT_COMMIT_PROBABILITY;
use thiserror::Error;

/// Which service this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceRole {
    #[default]
    Inventory,
    Payment,
    Executor,
}

impl ServiceRole {
    /// Port the service listens on when `PORT` is not set.
    pub fn default_port(&self) -> u16 {
        match self {
            ServiceRole::Inventory => 50056,
            ServiceRole::Payment => 50059,
            ServiceRole::Executor => 50055,
        }
    }
}

impl FromStr for ServiceRole {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventory" | "book_database" => Ok(ServiceRole::Inventory),
            "payment" | "payment_executor" => Ok(ServiceRole::Payment),
            "executor" | "order_executor" => Ok(ServiceRole::Executor),
            _ => Err(ConfigError::InvalidRole(s.to_string())),
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceRole::Inventory => f.write_str("inventory"),
            ServiceRole::Payment => f.write_str("payment"),
            ServiceRole::Executor => f.write_str("executor"),
        }
    }
}

/// Errors raised while reading the configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown SERVICE_ROLE {0:?}, expected inventory, payment or executor")]
    InvalidRole(String),

    #[error("invalid {var}={value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SERVICE_ROLE`: `inventory`, `payment` or `executor` (default: `inventory`)
/// - `HOST` / `PORT`: bind address (default: `0.0.0.0` and the role's port)
/// - `REPLICA_ID` / `TOTAL_REPLICAS`: position in the chain or ring (default: `1` of `3`)
/// - `INVENTORY_ADDR_TEMPLATE` / `EXECUTOR_ADDR_TEMPLATE`: peer URLs with `{id}` substituted
/// - `INVENTORY_ENTRY_ID`: chain replica the coordinator talks to (default: `1`)
/// - `PAYMENT_ADDR` / `QUEUE_ADDR`: collaborator URLs
/// - `POLL_INTERVAL_MS`, `EVENT_DRIVEN_WAKEUP`, `HEALTH_CHECK_TIMEOUT_MS`,
///   `RETAIN_TOKEN_WHEN_ISOLATED`: token-ring scheduling
/// - `REQUEST_TIMEOUT_MS`: optional timeout on every outgoing call
/// - `VOTE_COMMIT_PROBABILITY`, `EXECUTION_DELAY_MS`, `ITEM_DELAYS`: fault injection
/// - `CATALOG_PATH`: JSON catalog seeding an inventory replica
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub role: ServiceRole,
    pub host: String,
    pub port: u16,
    pub replica_id: ReplicaId,
    pub total_replicas: u32,
    pub inventory_addr_template: String,
    pub executor_addr_template: String,
    pub inventory_entry_id: ReplicaId,
    pub payment_addr: String,
    pub queue_addr: String,
    pub poll_interval: Duration,
    pub event_driven_wakeup: bool,
    pub health_check_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub retain_token_when_isolated: bool,
    pub vote_commit_probability: f64,
    pub execution_delay: Duration,
    pub item_delays: HashMap<String, Duration>,
    pub catalog_path: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let role = match lookup("SERVICE_ROLE") {
            Some(raw) => raw.parse()?,
            None => defaults.role,
        };
        let replica_id = replica_var(&lookup, "REPLICA_ID")?.unwrap_or(defaults.replica_id);
        let total_replicas = parsed(&lookup, "TOTAL_REPLICAS").unwrap_or(defaults.total_replicas);
        if replica_id.get() > total_replicas {
            return Err(ConfigError::InvalidValue {
                var: "REPLICA_ID",
                value: replica_id.to_string(),
                reason: format!("greater than TOTAL_REPLICAS ({total_replicas})"),
            });
        }

        let item_delays = match lookup("ITEM_DELAYS") {
            Some(raw) => FaultInjection::parse_item_delays(&raw).map_err(|reason| {
                ConfigError::InvalidValue {
                    var: "ITEM_DELAYS",
                    value: raw.clone(),
                    reason,
                }
            })?,
            None => HashMap::new(),
        };

        Ok(Self {
            role,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or_else(|| role.default_port()),
            replica_id,
            total_replicas,
            inventory_addr_template: lookup("INVENTORY_ADDR_TEMPLATE")
                .unwrap_or(defaults.inventory_addr_template),
            executor_addr_template: lookup("EXECUTOR_ADDR_TEMPLATE")
                .unwrap_or(defaults.executor_addr_template),
            inventory_entry_id: replica_var(&lookup, "INVENTORY_ENTRY_ID")?
                .unwrap_or(defaults.inventory_entry_id),
            payment_addr: lookup("PAYMENT_ADDR").unwrap_or(defaults.payment_addr),
            queue_addr: lookup("QUEUE_ADDR").unwrap_or(defaults.queue_addr),
            poll_interval: millis(&lookup, "POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            event_driven_wakeup: flag(&lookup, "EVENT_DRIVEN_WAKEUP")
                .unwrap_or(defaults.event_driven_wakeup),
            health_check_timeout: millis(&lookup, "HEALTH_CHECK_TIMEOUT_MS")
                .unwrap_or(defaults.health_check_timeout),
            request_timeout: millis(&lookup, "REQUEST_TIMEOUT_MS"),
            retain_token_when_isolated: flag(&lookup, "RETAIN_TOKEN_WHEN_ISOLATED")
                .unwrap_or(defaults.retain_token_when_isolated),
            vote_commit_probability: parsed(&lookup, "VOTE_COMMIT_PROBABILITY")
                .unwrap_or(defaults.vote_commit_probability),
            execution_delay: millis(&lookup, "EXECUTION_DELAY_MS")
                .unwrap_or(defaults.execution_delay),
            item_delays,
            catalog_path: lookup("CATALOG_PATH").map(PathBuf::from),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of inventory replica `id`.
    pub fn inventory_addr(&self, id: ReplicaId) -> String {
        expand(&self.inventory_addr_template, id)
    }

    pub fn ring_config(&self) -> RingConfig {
        RingConfig {
            poll_interval: self.poll_interval,
            event_driven: self.event_driven_wakeup,
            health_timeout: self.health_check_timeout,
            retain_when_isolated: self.retain_token_when_isolated,
        }
    }

    pub fn faults(&self) -> FaultInjection {
        FaultInjection {
            execution_delay: self.execution_delay,
            item_delays: self.item_delays.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: ServiceRole::Inventory,
            host: "0.0.0.0".to_string(),
            port: ServiceRole::Inventory.default_port(),
            replica_id: ReplicaId::FIRST,
            total_replicas: 3,
            inventory_addr_template: "http://book_database_{id}:50056".to_string(),
            executor_addr_template: "http://order_executor_{id}:50055".to_string(),
            inventory_entry_id: ReplicaId::FIRST,
            payment_addr: "http://payment_executor:50059".to_string(),
            queue_addr: "http://order_queue:50054".to_string(),
            poll_interval: Duration::from_millis(20_000),
            event_driven_wakeup: false,
            health_check_timeout: Duration::from_millis(5_000),
            request_timeout: None,
            retain_token_when_isolated: false,
            vote_commit_probability: DEFAULT_COMMIT_PROBABILITY,
            execution_delay: Duration::ZERO,
            item_delays: HashMap::new(),
            catalog_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Substitutes `{id}` in an address template.
pub fn expand(template: &str, id: ReplicaId) -> String {
    template.replace("{id}", &id.to_string())
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn millis<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parsed(lookup, key).map(Duration::from_millis)
}

fn flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn replica_var<F>(lookup: &F, key: &'static str) -> Result<Option<ReplicaId>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.parse::<ReplicaId>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: key,
                    value: raw.clone(),
                    reason,
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.role, ServiceRole::Inventory);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 50056);
        assert_eq!(config.total_replicas, 3);
        assert_eq!(config.poll_interval, Duration::from_secs(20));
        assert_eq!(config.health_check_timeout, Duration::from_secs(5));
        assert!(config.request_timeout.is_none());
        assert_eq!(config.vote_commit_probability, 0.95);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_role_selects_default_port() {
        let config = Config::from_lookup(lookup_from(&[("SERVICE_ROLE", "executor")])).unwrap();
        assert_eq!(config.role, ServiceRole::Executor);
        assert_eq!(config.addr(), "0.0.0.0:50055");

        let config = Config::from_lookup(lookup_from(&[
            ("SERVICE_ROLE", "payment"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SERVICE_ROLE", "queue")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidRole("queue".to_string()));
    }

    #[test]
    fn test_replica_id_must_be_in_range() {
        assert!(Config::from_lookup(lookup_from(&[("REPLICA_ID", "0")])).is_err());
        assert!(
            Config::from_lookup(lookup_from(&[("REPLICA_ID", "4"), ("TOTAL_REPLICAS", "3")]))
                .is_err()
        );
    }

    #[test]
    fn test_address_templates() {
        let config = Config::default();
        let id = ReplicaId::new(2).unwrap();
        assert_eq!(config.inventory_addr(id), "http://book_database_2:50056");
        assert_eq!(
            expand(&config.executor_addr_template, id),
            "http://order_executor_2:50055"
        );
    }

    #[test]
    fn test_ring_and_fault_settings() {
        let config = Config::from_lookup(lookup_from(&[
            ("SERVICE_ROLE", "executor"),
            ("POLL_INTERVAL_MS", "250"),
            ("EVENT_DRIVEN_WAKEUP", "true"),
            ("RETAIN_TOKEN_WHEN_ISOLATED", "1"),
            ("REQUEST_TIMEOUT_MS", "1500"),
            ("EXECUTION_DELAY_MS", "30000"),
            ("ITEM_DELAYS", "1=100,2=200"),
        ]))
        .unwrap();

        let ring = config.ring_config();
        assert_eq!(ring.poll_interval, Duration::from_millis(250));
        assert!(ring.event_driven);
        assert!(ring.retain_when_isolated);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));

        let faults = config.faults();
        assert_eq!(faults.execution_delay, Duration::from_secs(30));
        assert_eq!(faults.item_delay("2"), Duration::from_millis(200));
    }

    #[test]
    fn test_malformed_item_delays_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("ITEM_DELAYS", "1=later")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "ITEM_DELAYS", .. }));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe {
            std::env::set_var("SERVICE_ROLE", "payment");
            std::env::set_var("VOTE_COMMIT_PROBABILITY", "0.5");
        }
        let config = Config::from_env();
        unsafe {
            std::env::remove_var("SERVICE_ROLE");
            std::env::remove_var("VOTE_COMMIT_PROBABILITY");
        }

        let config = config.unwrap();
        assert_eq!(config.role, ServiceRole::Payment);
        assert_eq!(config.port, 50059);
        assert_eq!(config.vote_commit_probability, 0.5);
    }
}
