use sea_orm::entity::prelude::*;

/// Pending OTP hand-off to the SMS dispatcher. One row per issued challenge.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Always `otp_issued` today.
    pub kind: String,
    /// `{ phone, purpose, code, expires_at }`.
    pub payload: Json,
    /// `otp_issued:<challenge id>`, so a challenge is queued for SMS at most once.
    #[sea_orm(unique)]
    pub idempotency_key: String,
    /// SMS send attempts made by the dispatcher.
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Earliest time the dispatcher may try sending again.
    pub next_attempt_at: chrono::DateTime<chrono::Utc>,
    /// Set once the SMS gateway accepted the message.
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Set when the dispatcher gives up on the message.
    pub failed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
