use thiserror::Error;

/// Identifies which backing store a database-kind error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Mysql,
    Mongo,
    Redis,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::Mysql => write!(f, "Mysql"),
            DatabaseType::Mongo => write!(f, "Mongo"),
            DatabaseType::Redis => write!(f, "Redis"),
        }
    }
}

/// Terminal errors that abort a site's reconciliation instead of being retried.
///
/// Mirrors the `IsFinal() bool` contract of the original `helpers/errors` package:
/// the orchestrator catches these, latches `status.state = Failed`, and stops
/// requeueing until the site's spec changes again.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(
        "Failed to create {database_type} database for site {site}, service {service} in environment {environment}{}",
        reason.as_ref().map(|r| format!(". Reason: {r}")).unwrap_or_default()
    )]
    DatabaseCreationError {
        database_type: DatabaseType,
        site: String,
        service: String,
        environment: String,
        reason: Option<String>,
    },

    #[error(
        "Database initialisation failed for site {site}, service {service}{}",
        reason.as_ref().map(|r| format!(". Reason: {r}")).unwrap_or_default()
    )]
    DatabaseInitError {
        site: String,
        service: String,
        reason: Option<String>,
    },

    #[error(
        "Database migration failed for site {site}, service {service}{}",
        reason.as_ref().map(|r| format!(". Reason: {r}")).unwrap_or_default()
    )]
    DatabaseMigrationError {
        site: String,
        service: String,
        reason: Option<String>,
    },

    #[error(
        "Not all templates have been resolved in the {entity_type}{}. Unresolved template variables: {unresolved:?}. Available template variables: {available:?}",
        key.as_ref().map(|k| format!(" at key {k}")).unwrap_or_default()
    )]
    UnresolvedTemplatesError {
        entity_type: String,
        key: Option<String>,
        unresolved: Vec<String>,
        available: Vec<String>,
    },
}

impl ControllerError {
    /// Whether this error should latch the owning site into `Failed` rather
    /// than be retried by the reconciler's error policy.
    pub fn is_final(&self) -> bool {
        true
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_yaml::Error),

    #[error("Kube Error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Finalizer Error: {0}")]
    // NB: awkward type because finalizer::Error embeds the reconciler error (which is this)
    // so boxing this error to break cycles
    FinalizerError(#[source] Box<kube::runtime::finalizer::Error<Error>>),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Naming error: {0}")]
    Naming(String),

    #[error("MySQL driver error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Mongo driver error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Redis driver error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn metric_label(&self) -> String {
        format!("{self:?}").to_lowercase()
    }

    /// True for errors that should latch the site into `Failed` rather than requeue.
    pub fn is_final(&self) -> bool {
        matches!(self, Error::Controller(e) if e.is_final())
    }
}
