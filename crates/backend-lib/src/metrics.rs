// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_ACTIVE: &str = "session.active";
pub const USER_CREATED: &str = "user.created";
pub const USER_LOGIN_OK: &str = "user.login.ok";
pub const USER_LOGIN_FAILED: &str = "user.login.failed";
pub const FEEDBACK_SUBMITTED: &str = "feedback.submitted";
pub const CHAT_CONNECTION: &str = "chat.connection";
pub const CHAT_PARTICIPANTS: &str = "chat.participants";
pub const CHAT_MESSAGE: &str = "chat.message";
pub const CHAT_DROPPED: &str = "chat.dropped";
