use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoLayerError, DaoResult, UserDao},
    db::entities::user,
    identity::Profile,
};

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
}

impl UserService {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    pub async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<user::Model>> {
        match self.user_dao.find_by_id(id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Maps a federated profile to a local user, keyed by email.
    ///
    /// A losing insert in a race on the unique email re-reads the row the
    /// winner created.
    pub async fn find_or_create(&self, profile: &Profile) -> DaoResult<user::Model> {
        if let Some(existing) = self.user_dao.find_by_email(&profile.email).await? {
            return Ok(existing);
        }

        match self
            .user_dao
            .create_user(&profile.name, &profile.email, profile.photo_url.as_deref())
            .await
        {
            Ok(created) => Ok(created),
            // Only reachable against a real database: `sql_err()` does not
            // classify mock errors as unique violations.
            Err(err) if err.is_unique_violation() => {
                tracing::debug!(email = %profile.email, "user created concurrently, re-reading");
                self.user_dao.find_by_email(&profile.email).await?.ok_or(err)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use uuid::Uuid;

    use super::UserService;
    use crate::{
        db::dao::{DaoBase, DaoLayerError, UserDao},
        db::entities::user,
        identity::Profile,
        test_helpers::statement_log,
    };

    fn profile() -> Profile {
        Profile {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            photo_url: None,
        }
    }

    fn user_row(id: Uuid) -> user::Model {
        let now = Utc::now().fixed_offset();
        user::Model {
            id,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            photo_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn existing_email_is_reused_without_insert() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_row(id)]])
            .into_connection();
        let service = UserService::new(UserDao::new(&db));

        let user = service
            .find_or_create(&profile())
            .await
            .expect("lookup should succeed");
        assert_eq!(user.id, id);

        let log = statement_log(db);
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn unknown_email_creates_user() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[user_row(id)]])
            .into_connection();
        let service = UserService::new(UserDao::new(&db));

        let user = service
            .find_or_create(&profile())
            .await
            .expect("create should succeed");
        assert_eq!(user.id, id);

        let log = statement_log(db);
        assert!(log.contains("INSERT INTO \"users\""));
    }

    #[tokio::test]
    async fn insert_failure_propagates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_errors([DbErr::Custom("disk full".to_string())])
            .into_connection();
        let service = UserService::new(UserDao::new(&db));

        let err = service
            .find_or_create(&profile())
            .await
            .expect_err("insert should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
        assert!(!err.is_unique_violation());
        assert_eq!(statement_log(db).matches("SELECT").count(), 1);
    }

    #[tokio::test]
    async fn find_by_id_treats_missing_as_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let service = UserService::new(UserDao::new(&db));

        let user = service
            .find_by_id(Uuid::new_v4())
            .await
            .expect("lookup should succeed");
        assert!(user.is_none());
    }
}
