use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};

use super::{DaoBase, DaoResult};
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find_one(move |query| query.filter(user::Column::Email.eq(email)))
            .await
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        photo_url: Option<&str>,
    ) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            photo_url: Set(photo_url.map(str::to_string)),
            ..Default::default()
        };
        self.create(model).await
    }
}
