//! In-process user and revocation storage for the demo service.

use async_trait::async_trait;
use jwt_auth::auth::{RevocationOracle, RevocationRecord, UserEntity, UserLookup};
use jwt_auth::AuthError;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct DemoUser {
    pub id: String,
    pub roles: Vec<String>,
}

impl UserEntity for DemoUser {
    fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(String::as_str).collect()
    }
}

/// Users are fixed at startup; revocation records are written on logout.
#[derive(Debug, Default)]
pub struct DemoStore {
    users: HashMap<String, DemoUser>,
    revocations: RwLock<HashMap<String, RevocationRecord>>,
}

impl DemoStore {
    /// Store seeded with `alice` (admin, editor) and `bob` (viewer).
    pub fn seeded() -> Self {
        let users = [("alice", vec!["admin", "editor"]), ("bob", vec!["viewer"])]
            .into_iter()
            .map(|(id, roles)| {
                (
                    id.to_string(),
                    DemoUser {
                        id: id.to_string(),
                        roles: roles.into_iter().map(String::from).collect(),
                    },
                )
            })
            .collect();

        Self {
            users,
            revocations: RwLock::new(HashMap::new()),
        }
    }

    pub fn user(&self, id: &str) -> Option<&DemoUser> {
        self.users.get(id)
    }

    pub async fn revoke(&self, subject: &str, record: RevocationRecord) {
        self.revocations
            .write()
            .await
            .insert(subject.to_string(), record);
    }
}

#[async_trait]
impl RevocationOracle for DemoStore {
    async fn get_from_cache(
        &self,
        subject_id: &str,
    ) -> Result<Option<RevocationRecord>, AuthError> {
        Ok(self.revocations.read().await.get(subject_id).cloned())
    }
}

#[async_trait]
impl UserLookup<DemoUser> for DemoStore {
    async fn find(&self, row_id: &str) -> Result<Option<DemoUser>, AuthError> {
        Ok(self.users.get(row_id).cloned())
    }
}
