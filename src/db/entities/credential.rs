//! One row per issued refresh token.
//!
//! Rows are append-only: revocation sets `revoked_at`/`revoked_by_ip` (and
//! `replaced_by` when the token was rotated) exactly once, and nothing deletes
//! them.

use chrono::{DateTime, FixedOffset};
use sea_orm::{ActiveValue::Set, entity::prelude::*};

use crate::db::dao::base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "auth_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub refresh_token: String,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    pub created_by_ip: String,
    pub expiry_date: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    pub revoked_at: Option<DateTimeWithTimeZone>,
    pub revoked_by_ip: Option<String>,
    pub replaced_by: Option<String>,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Restrict")]
    pub user: HasOne<super::user::Entity>,
}

impl Model {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<FixedOffset>) -> bool {
        self.expiry_date <= now
    }

    pub fn is_active_at(&self, now: DateTime<FixedOffset>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl HasIdActiveModel for ActiveModel {
    fn set_id(&mut self, id: Uuid) {
        self.id = Set(id);
    }
}

impl TimestampedActiveModel for ActiveModel {
    fn set_created_at(&mut self, ts: DateTimeWithTimeZone) {
        self.created_at = Set(ts);
    }
}

impl HasCreatedAtColumn for Entity {
    fn created_at_column() -> Column {
        Column::CreatedAt
    }
}
