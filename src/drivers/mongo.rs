//! MongoDB tenant driver, grounded in `handlers/database/mongo_handler.go`.
//!
//! Unlike MySQL, the Mongo driver talks to the server through the `mongodb`
//! crate's typed command builders rather than interpolated strings, so there
//! is no identifier-escaping concern here: `createUser`/`updateUser` send the
//! username as a BSON field value, never as part of a parsed command name.

use super::{DatabaseDriver, DatabaseIdentity};
use crate::apis::dbconfig_types::MongoConfigSpec;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MongoDriver {
    client: Client,
}

impl MongoDriver {
    pub async fn connect(config: &MongoConfigSpec) -> crate::Result<Self> {
        let hosts: Vec<String> = [&config.host1, &config.host2, &config.host3]
            .into_iter()
            .filter(|h| !h.is_empty())
            .cloned()
            .collect();
        let uri = format!(
            "mongodb://{}:{}@{}/admin",
            config.username,
            config.password,
            hosts
                .iter()
                .map(|h| format!("{h}:{}", config.port))
                .collect::<Vec<_>>()
                .join(",")
        );
        let mut options = ClientOptions::parse(&uri).await?;
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        let client = Client::with_options(options)?;
        Ok(Self { client })
    }

    fn admin_db(&self) -> mongodb::Database {
        self.client.database("admin")
    }

    async fn user_info(&self, username: &str) -> crate::Result<Option<mongodb::bson::Document>> {
        let result = self
            .admin_db()
            .run_command(doc! { "usersInfo": { "user": username, "db": "admin" } }, None)
            .await?;
        let users = result.get_array("users").cloned().unwrap_or_default();
        Ok(users.into_iter().find_map(|u| u.as_document().cloned()))
    }
}

#[async_trait]
impl DatabaseDriver for MongoDriver {
    async fn reconcile(&self, identity: &DatabaseIdentity) -> crate::Result<bool> {
        let roles = vec![doc! { "role": "readWrite", "db": identity.database.clone() }];
        let mut changed = false;

        match self.user_info(&identity.username).await? {
            Some(_) => {
                self.admin_db()
                    .run_command(
                        doc! {
                            "updateUser": identity.username.clone(),
                            "pwd": identity.password.clone(),
                            "roles": roles.clone(),
                        },
                        None,
                    )
                    .await?;
                changed = true;
            }
            None => {
                self.admin_db()
                    .run_command(
                        doc! {
                            "createUser": identity.username.clone(),
                            "pwd": identity.password.clone(),
                            "roles": roles,
                        },
                        None,
                    )
                    .await?;
                changed = true;
            }
        }

        Ok(changed)
    }

    async fn delete(&self, identity: &DatabaseIdentity) -> crate::Result<()> {
        if self.user_info(&identity.username).await?.is_some() {
            self.admin_db()
                .run_command(doc! { "dropUser": identity.username.clone() }, None)
                .await?;
        }
        if !identity.database.is_empty() {
            self.client.database(&identity.database).drop(None).await?;
        }
        Ok(())
    }
}
