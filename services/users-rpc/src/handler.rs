//! Message semantics for the users lookup RPC
//!
//! Decoding and lookup are kept free of broker types so they can be
//! unit-tested without a running RabbitMQ.

use serde::{Deserialize, Serialize};
use tracing::error;

use users::repositories::UserRepository;

/// Inbound request body
///
/// A missing `user_id` key decodes as `None` and is answered as a lookup
/// miss; a body that is not valid JSON for this shape is a decode failure
/// and gets no reply.
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub user_id: Option<i64>,
}

/// The slice of a user exposed over the RPC channel
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
}

/// Reply body; `user` is absent when `ok` is false
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LookupReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl LookupReply {
    fn found(id: i64, name: String) -> Self {
        Self {
            ok: true,
            user: Some(UserSummary { id, name }),
        }
    }

    fn miss() -> Self {
        Self { ok: false, user: None }
    }
}

/// Decode an inbound message body
pub fn decode_request(body: &[u8]) -> Result<LookupRequest, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Look up a user and build the reply
///
/// Never fails: a missing id, an absent user, and a repository error all
/// collapse to `ok: false`. Errors are logged, not propagated.
pub async fn lookup(repository: &dyn UserRepository, user_id: Option<i64>) -> LookupReply {
    let Some(id) = user_id else {
        return LookupReply::miss();
    };

    match repository.find_by_id(id).await {
        Ok(Some(user)) => LookupReply::found(user.id, user.name),
        Ok(None) => LookupReply::miss(),
        Err(e) => {
            error!("User lookup failed: {}", e);
            LookupReply::miss()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use users::models::{NewUser, Permissions, UpdateUser, User};
    use users::repositories::{InMemoryUserRepository, RepositoryError};

    /// Repository whose every operation fails, for the catch-all path
    struct FailingRepository;

    #[async_trait]
    impl UserRepository for FailingRepository {
        async fn create(&self, _: &NewUser) -> Result<User, RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
        async fn find_by_id(&self, _: i64) -> Result<Option<User>, RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
        async fn find_by_name(&self, _: &str) -> Result<Option<User>, RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
        async fn list(&self) -> Result<Vec<User>, RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
        async fn replace(&self, _: i64, _: &NewUser) -> Result<User, RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
        async fn patch(&self, _: i64, _: &UpdateUser) -> Result<User, RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
        async fn delete(&self, _: i64) -> Result<(), RepositoryError> {
            Err(RepositoryError::Store("connection refused".to_string()))
        }
    }

    #[test]
    fn decode_accepts_a_well_formed_request() {
        let request = decode_request(br#"{"user_id": 7}"#).unwrap();
        assert_eq!(request.user_id, Some(7));
    }

    #[test]
    fn decode_tolerates_a_missing_user_id() {
        let request = decode_request(br#"{}"#).unwrap();
        assert_eq!(request.user_id, None);
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(decode_request(b"not json").is_err());
    }

    #[test]
    fn decode_rejects_a_wrong_typed_user_id() {
        assert!(decode_request(br#"{"user_id": "seven"}"#).is_err());
    }

    #[tokio::test]
    async fn lookup_of_an_existing_user_replies_with_id_and_name_only() {
        let repo = InMemoryUserRepository::new();
        let created = repo
            .create(&NewUser {
                name: "andrew".to_string(),
                permissions: Permissions::Employee,
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        let reply = lookup(&repo, Some(created.id)).await;
        assert_eq!(
            reply,
            LookupReply {
                ok: true,
                user: Some(UserSummary {
                    id: created.id,
                    name: "andrew".to_string(),
                }),
            }
        );

        // The wire shape carries no password
        let encoded = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!({"ok": true, "user": {"id": created.id, "name": "andrew"}})
        );
    }

    #[tokio::test]
    async fn lookup_of_a_missing_user_replies_not_ok_without_a_user_key() {
        let repo = InMemoryUserRepository::new();

        let reply = lookup(&repo, Some(999)).await;
        assert_eq!(reply, LookupReply::miss());

        let encoded = serde_json::to_value(&reply).unwrap();
        assert_eq!(encoded, serde_json::json!({"ok": false}));
    }

    #[tokio::test]
    async fn lookup_without_an_id_replies_not_ok() {
        let repo = InMemoryUserRepository::new();
        assert_eq!(lookup(&repo, None).await, LookupReply::miss());
    }

    #[tokio::test]
    async fn lookup_over_a_failing_repository_replies_not_ok() {
        let reply = lookup(&FailingRepository, Some(1)).await;
        assert_eq!(reply, LookupReply::miss());
    }
}
