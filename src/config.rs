//! Operator configuration, loaded from a YAML file at startup.
//!
//! Grounded in the teacher's env-var `Config` idiom (`config.rs`) and in the
//! shape of the original's `apis/controller-config/v1::ProjectConfig`.

use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct OperatorConfig {
    pub health_probe_bind_address: String,
    pub metrics_bind_address: String,
    pub leader_election: bool,
    pub sentry_dsn: Option<String>,
    pub init_job_config: JobConfig,
    pub migration_job_config: JobConfig,
    pub backup_job_config: JobConfig,
    /// Consecutive job-load-not-found readings tolerated before a db-init or
    /// migration job is marked Failed by exhaustion. See
    /// [`crate::reconcilers::job`] for how this is combined with a live
    /// fallback read to distinguish cold cache from a genuinely missing job.
    pub db_init_max_job_failed_load_limit: u32,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            health_probe_bind_address: from_env_default("HEALTH_PROBE_BIND_ADDRESS", "0.0.0.0:8081"),
            metrics_bind_address: from_env_default("METRICS_BIND_ADDRESS", "0.0.0.0:8080"),
            leader_election: from_env_default("LEADER_ELECTION", "false").parse().unwrap_or(false),
            sentry_dsn: env::var("SENTRY_DSN").ok(),
            // the init job's backoff defaults to 0: retrying a half-finished
            // init job can leave a database half seeded
            init_job_config: JobConfig { backoff_limit: 0, ..JobConfig::default() },
            migration_job_config: JobConfig::default(),
            backup_job_config: JobConfig::default(),
            db_init_max_job_failed_load_limit: 5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct JobConfig {
    pub deadline_seconds: i64,
    pub ttl_seconds: i32,
    pub backoff_limit: i32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { deadline_seconds: 600, ttl_seconds: 600, backoff_limit: 3 }
    }
}

impl OperatorConfig {
    /// Loads configuration from the YAML file at `path`, falling back to
    /// defaults for anything it doesn't set.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| crate::Error::Config(format!("reading {}: {e}", path.as_ref().display())))?;
        serde_yaml::from_str(&contents).map_err(|e| crate::Error::Config(format!("parsing config: {e}")))
    }

    /// Loads from `CONFIG_PATH` if set, otherwise uses built-in defaults.
    pub fn load_from_env_or_default() -> crate::Result<Self> {
        match env::var("CONFIG_PATH") {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn from_env_default(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_init_job_has_zero_backoff() {
        let config = OperatorConfig::default();
        assert_eq!(config.init_job_config.backoff_limit, 0);
        assert_eq!(config.migration_job_config.backoff_limit, 3);
    }
}
