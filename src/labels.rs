//! Label and annotation key constants, grounded in
//! `helpers/labels/constants.go`.

pub const SITE: &str = "operator.kube-stager.io/site";
pub const SERVICE: &str = "operator.kube-stager.io/service";
pub const MYSQL_ENVIRONMENT: &str = "operator.kube-stager.io/mysql-environment";
pub const MONGO_ENVIRONMENT: &str = "operator.kube-stager.io/mongo-environment";
pub const REDIS_ENVIRONMENT: &str = "operator.kube-stager.io/redis-environment";
pub const TYPE: &str = "operator.kube-stager.io/type";
pub const JOB_NAME: &str = "operator.kube-stager.io/job-name";
