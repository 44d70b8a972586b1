use crate::apis::site_types::TimeInterval;

pub fn default_enabled() -> bool {
    true
}

pub fn default_true() -> bool {
    true
}

/// A site left untouched auto-disables after 2 days.
pub fn default_disable_after() -> TimeInterval {
    TimeInterval { never: false, days: 2, hours: 0, minutes: 0 }
}

/// A site left untouched auto-deletes (with its databases) after 7 days.
pub fn default_delete_after() -> TimeInterval {
    TimeInterval { never: false, days: 7, hours: 0, minutes: 0 }
}

pub fn default_image_tag() -> String {
    "latest".to_owned()
}

pub fn default_replicas() -> i32 {
    1
}

pub fn default_mysql_port() -> u16 {
    3306
}

pub fn default_mongo_port() -> u16 {
    27017
}

pub fn default_redis_port() -> u16 {
    6379
}

pub fn default_redis_available_database_count() -> u32 {
    16
}
