use sea_orm::entity::prelude::*;

use crate::types::internal::role::Role;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Stored lowercased; uniqueness is case-insensitive
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,

    // Session lifecycle
    pub token_epoch: i64,
    pub failed_login_attempts: i32,
    pub locked_until: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Model {
    /// Whether a lock is in force at `now` (unix seconds)
    pub fn is_locked_at(&self, now: i64) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::refresh_token::Entity")]
    RefreshToken,
}

impl Related<super::refresh_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
