use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{credential, prelude::Credential};

/// Fields of a freshly issued refresh token. Revocation columns start empty.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub refresh_token: String,
    pub user_id: Uuid,
    pub created_by_ip: String,
    pub expiry_date: DateTime<FixedOffset>,
}

impl From<NewCredential> for credential::ActiveModel {
    fn from(value: NewCredential) -> Self {
        credential::ActiveModel {
            refresh_token: Set(value.refresh_token),
            user_id: Set(value.user_id),
            created_by_ip: Set(value.created_by_ip),
            expiry_date: Set(value.expiry_date),
            revoked_at: Set(None),
            revoked_by_ip: Set(None),
            replaced_by: Set(None),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Revocation {
    pub at: DateTime<FixedOffset>,
    pub by_ip: String,
}

#[derive(Clone)]
pub struct CredentialDao {
    db: DatabaseConnection,
}

impl DaoBase for CredentialDao {
    type Entity = Credential;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl CredentialDao {
    /// Looks up a record by token value regardless of its revocation state.
    pub async fn find_by_token(&self, token: &str) -> DaoResult<Option<credential::Model>> {
        let token = token.to_string();
        self.find_one(move |query| query.filter(credential::Column::RefreshToken.eq(token)))
            .await
    }

    pub async fn insert(&self, new: NewCredential) -> DaoResult<credential::Model> {
        self.create(credential::ActiveModel::from(new)).await
    }

    /// Revokes `old_token` in favour of `next` and inserts `next`, in one
    /// transaction.
    ///
    /// The revoke only matches a row whose `revoked_at` is still NULL. When it
    /// matches nothing, a concurrent rotation already consumed the token and
    /// `DaoLayerError::Conflict` is returned with nothing written.
    pub async fn rotate(
        &self,
        old_token: &str,
        revocation: &Revocation,
        next: NewCredential,
    ) -> DaoResult<credential::Model> {
        let txn = self.db.begin().await?;

        let revoked = Credential::update_many()
            .col_expr(credential::Column::RevokedAt, Expr::value(revocation.at))
            .col_expr(
                credential::Column::RevokedByIp,
                Expr::value(revocation.by_ip.clone()),
            )
            .col_expr(
                credential::Column::ReplacedBy,
                Expr::value(next.refresh_token.clone()),
            )
            .filter(credential::Column::RefreshToken.eq(old_token))
            .filter(credential::Column::RevokedAt.is_null())
            .exec(&txn)
            .await?;

        if revoked.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DaoLayerError::Conflict {
                entity: std::any::type_name::<Credential>(),
            });
        }

        let created = Self::create_on(&txn, credential::ActiveModel::from(next)).await?;
        txn.commit().await?;
        Ok(created)
    }

    /// Revokes every active record issued to `user_id` from `created_by_ip`.
    /// Returns the rows that changed.
    pub async fn revoke_active_for(
        &self,
        user_id: Uuid,
        created_by_ip: &str,
        revocation: &Revocation,
    ) -> DaoResult<Vec<credential::Model>> {
        Credential::update_many()
            .col_expr(credential::Column::RevokedAt, Expr::value(revocation.at))
            .col_expr(
                credential::Column::RevokedByIp,
                Expr::value(revocation.by_ip.clone()),
            )
            .filter(credential::Column::UserId.eq(user_id))
            .filter(credential::Column::CreatedByIp.eq(created_by_ip))
            .filter(credential::Column::RevokedAt.is_null())
            .filter(credential::Column::ExpiryDate.gt(revocation.at))
            .exec_with_returning(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }
}
