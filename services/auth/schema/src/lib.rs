//! sea-orm entities owned by the auth service.

pub mod accounts;
pub mod otp_challenges;
pub mod outbox_events;
pub mod session_tokens;
