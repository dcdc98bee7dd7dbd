// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the portfolio site's browser client and server.
//! This module defines the chat WebSocket protocol and the JSON bodies of the form endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the single implicit chat room
pub const MAIN_ROOM: &str = "main";

/// A user's fixed category
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    /// The site owner
    Owner,
    /// A registered visitor
    Guest,
    /// Anything else a registration asked for
    Other,
}

impl Role {
    /// Lowercase name as stored in the `users.role` column
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Guest => "guest",
            Role::Other => "other",
        }
    }

    /// Tag shown next to a display name in the chat room
    pub fn chat_tag(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Guest | Role::Other => "Guest",
        }
    }

    /// Style class applied to a regular chat line from this role
    pub fn message_class(self) -> StyleClass {
        match self {
            Role::Owner => StyleClass::OwnerMessage,
            Role::Guest | Role::Other => StyleClass::UserMessage,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Role::Owner,
            "guest" => Role::Guest,
            _ => Role::Other,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages sent from a chat client to the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChatClientEvent {
    /// The client entered the room
    Joined,
    /// The client is leaving the room
    Left,
    /// A line of chat
    /// # Fields
    /// * `msg` - Text typed by the user
    Message { msg: String },
}

/// Style class attached to every broadcast line
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StyleClass {
    SystemMessage,
    OwnerMessage,
    UserMessage,
}

/// Messages sent from the server to chat clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChatServerEvent {
    /// A line to display in the room
    Status {
        /// Display text, already prefixed with the sender's name and role
        msg: String,
        /// Presentation hint
        class: StyleClass,
    },
    /// A frame from this client could not be understood
    Error {
        /// What went wrong
        message: String,
    },
}

/// Login form body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub role: String,
    pub name: String,
}

/// Feedback form body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FeedbackForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub comment: Option<String>,
}

/// One stored feedback row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEntry {
    pub comment_id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub comment: Option<String>,
}

/// Structured success/failure value returned by the auth operations
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    /// `1` on success, `0` on failure
    pub success: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AuthOutcome {
    pub fn ok() -> Self {
        Self { success: 1, message: None, role: None, name: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: 0, message: Some(message.into()), role: None, name: None }
    }
}

/// Reply to `POST /processlogin`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LoginReply {
    /// Credentials accepted
    Accepted { success: u8, redirect: String },
    /// Credentials rejected
    Rejected { success: u8, message: String, failed_attempts: u32 },
}

impl LoginReply {
    pub fn accepted(redirect: impl Into<String>) -> Self {
        LoginReply::Accepted { success: 1, redirect: redirect.into() }
    }

    pub fn rejected(message: impl Into<String>, failed_attempts: u32) -> Self {
        LoginReply::Rejected { success: 0, message: message.into(), failed_attempts }
    }
}
