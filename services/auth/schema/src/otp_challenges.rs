use sea_orm::entity::prelude::*;

/// One OTP challenge per issuance. Rows are never updated except `attempts` and `used`,
/// and are only deleted by the retention sweep.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_challenges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub phone: String,
    /// `"signup"`, `"login"` or `"password_reset"`.
    pub purpose: String,
    pub code: String,
    /// Name supplied at signup, handed back on verification.
    pub display_name: Option<String>,
    pub attempts: i32,
    pub used: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
