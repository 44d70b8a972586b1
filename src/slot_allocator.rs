//! Redis database-number allocation, grounded in
//! `handlers/task/redis_handler.go::getFirstFreeDatabaseInEnvironment`.
//!
//! Each Redis environment exposes a fixed number of logical databases
//! (`RedisConfigSpec::available_database_count`). A tenant's `RedisDatabase`
//! task reserves the lowest-numbered database not already claimed by another
//! `RedisDatabase` object in the same environment. The original never
//! connects to the server to pick a number; it scans the claimed set only.

use crate::apis::dbconfig_types::RedisConfigSpec;
use crate::apis::task_types::RedisDatabaseSpec;
use crate::Error;

/// Finds the lowest database number in `environment` not already claimed by
/// `existing`.
///
/// Preserves the original's exact error text so operators grepping logs
/// across the rewrite still find the same message.
pub fn first_free_database(config: &RedisConfigSpec, existing: &[RedisDatabaseSpec]) -> crate::Result<u32> {
    let claimed: std::collections::HashSet<u32> = existing.iter().map(|d| d.database_number).collect();

    (0..config.available_database_count)
        .find(|candidate| !claimed.contains(candidate))
        .ok_or_else(|| Error::Config("No free databases found in environment".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::task_types::EnvironmentConfig;

    fn env(site: &str, service: &str, environment: &str) -> EnvironmentConfig {
        EnvironmentConfig {
            site_name: site.to_owned(),
            service_name: service.to_owned(),
            environment: environment.to_owned(),
        }
    }

    #[test]
    fn claimed_numbers_are_tracked_regardless_of_owner() {
        let existing = vec![
            RedisDatabaseSpec { environment_config: env("a", "svc", "e1"), database_number: 0 },
            RedisDatabaseSpec { environment_config: env("b", "svc", "e1"), database_number: 1 },
        ];
        let config = RedisConfigSpec { available_database_count: 4, ..Default::default() };
        let free = first_free_database(&config, &existing).unwrap();
        assert_eq!(free, 2);
    }

    #[test]
    fn errors_when_environment_is_full() {
        let existing = vec![RedisDatabaseSpec { environment_config: env("a", "svc", "e1"), database_number: 0 }];
        let config = RedisConfigSpec { available_database_count: 1, ..Default::default() };
        assert!(first_free_database(&config, &existing).is_err());
    }
}
