use controller::apis::dbconfig_types::{MongoConfig, MysqlConfig, RedisConfig};
use controller::apis::job_types::{Backup, DbInitJob, DbMigrationJob};
use controller::apis::serviceconfig_types::ServiceConfig;
use controller::apis::site_types::StagingSite;
use controller::apis::task_types::{MongoDatabase, MysqlDatabase, RedisDatabase};
use kube::CustomResourceExt;

fn main() {
    let crds = vec![
        serde_yaml::to_string(&StagingSite::crd()).unwrap(),
        serde_yaml::to_string(&ServiceConfig::crd()).unwrap(),
        serde_yaml::to_string(&MysqlConfig::crd()).unwrap(),
        serde_yaml::to_string(&MongoConfig::crd()).unwrap(),
        serde_yaml::to_string(&RedisConfig::crd()).unwrap(),
        serde_yaml::to_string(&MysqlDatabase::crd()).unwrap(),
        serde_yaml::to_string(&MongoDatabase::crd()).unwrap(),
        serde_yaml::to_string(&RedisDatabase::crd()).unwrap(),
        serde_yaml::to_string(&DbInitJob::crd()).unwrap(),
        serde_yaml::to_string(&DbMigrationJob::crd()).unwrap(),
        serde_yaml::to_string(&Backup::crd()).unwrap(),
    ];
    print!("{}", crds.join("---\n"));
}
