use sea_orm::entity::prelude::*;

/// Seller or customer account. Both kinds share this table; `(account_kind, phone)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `"seller"` or `"customer"`.
    pub account_kind: String,
    pub phone: String,
    pub display_name: Option<String>,
    /// Argon2id PHC string; null for OTP-only accounts.
    pub password_hash: Option<String>,
    /// `"pending"` or `"enabled"`.
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_tokens::Entity")]
    SessionTokens,
}

impl Related<super::session_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
