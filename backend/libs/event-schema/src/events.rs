//! Fan-out events published by the messaging service after a committed write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File attachment as seen by event consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MessagingEvent {
    TextMessageSent {
        chat_id: Uuid,
        update_id: u64,
        sender_id: Uuid,
        created_at: DateTime<Utc>,
        text: String,
        reply_to: Option<u64>,
        forwarded: bool,
    },
    TextMessageEdited {
        chat_id: Uuid,
        update_id: u64,
        message_id: u64,
        sender_id: Uuid,
        created_at: DateTime<Utc>,
        new_text: String,
    },
    FileMessageSent {
        chat_id: Uuid,
        update_id: u64,
        sender_id: Uuid,
        created_at: DateTime<Utc>,
        file: FileInfo,
        reply_to: Option<u64>,
        forwarded: bool,
    },
    ReactionSent {
        chat_id: Uuid,
        update_id: u64,
        sender_id: Uuid,
        created_at: DateTime<Utc>,
        reaction_type: String,
        message_id: u64,
    },
    UpdateDeleted {
        chat_id: Uuid,
        update_id: u64,
        sender_id: Uuid,
        created_at: DateTime<Utc>,
        deleted_id: u64,
        mode: String,
    },
    SecretUpdateSent {
        chat_id: Uuid,
        update_id: u64,
        sender_id: Uuid,
        created_at: DateTime<Utc>,
        key_id: Uuid,
        /// base64
        payload: String,
        /// base64
        initialization_vector: String,
    },
    ChatCreated {
        chat_id: Uuid,
        sender_id: Uuid,
        chat_type: String,
        members: Vec<Uuid>,
    },
    ChatDeleted {
        chat_id: Uuid,
        sender_id: Uuid,
    },
    ChatBlocked {
        chat_id: Uuid,
        sender_id: Uuid,
    },
    ChatUnblocked {
        chat_id: Uuid,
        sender_id: Uuid,
    },
    ExpirationSet {
        chat_id: Uuid,
        sender_id: Uuid,
        expiration_seconds: Option<i64>,
    },
    GroupInfoUpdated {
        chat_id: Uuid,
        sender_id: Uuid,
        name: String,
        description: String,
        group_photo: Option<String>,
    },
    GroupMembersAdded {
        chat_id: Uuid,
        sender_id: Uuid,
        members: Vec<Uuid>,
    },
    GroupMembersRemoved {
        chat_id: Uuid,
        sender_id: Uuid,
        members: Vec<Uuid>,
    },
}

impl MessagingEvent {
    /// Get the event type string
    pub fn event_type(&self) -> &'static str {
        match self {
            MessagingEvent::TextMessageSent { .. } => "text_message",
            MessagingEvent::TextMessageEdited { .. } => "text_message_edited",
            MessagingEvent::FileMessageSent { .. } => "file_message",
            MessagingEvent::ReactionSent { .. } => "reaction",
            MessagingEvent::UpdateDeleted { .. } => "update_deleted",
            MessagingEvent::SecretUpdateSent { .. } => "secret_update",
            MessagingEvent::ChatCreated { .. } => "chat_created",
            MessagingEvent::ChatDeleted { .. } => "chat_deleted",
            MessagingEvent::ChatBlocked { .. } => "chat_blocked",
            MessagingEvent::ChatUnblocked { .. } => "chat_unblocked",
            MessagingEvent::ExpirationSet { .. } => "chat_expiration_set",
            MessagingEvent::GroupInfoUpdated { .. } => "group_info_updated",
            MessagingEvent::GroupMembersAdded { .. } => "group_members_added",
            MessagingEvent::GroupMembersRemoved { .. } => "group_members_removed",
        }
    }

    pub fn chat_id(&self) -> Uuid {
        match self {
            MessagingEvent::TextMessageSent { chat_id, .. }
            | MessagingEvent::TextMessageEdited { chat_id, .. }
            | MessagingEvent::FileMessageSent { chat_id, .. }
            | MessagingEvent::ReactionSent { chat_id, .. }
            | MessagingEvent::UpdateDeleted { chat_id, .. }
            | MessagingEvent::SecretUpdateSent { chat_id, .. }
            | MessagingEvent::ChatCreated { chat_id, .. }
            | MessagingEvent::ChatDeleted { chat_id, .. }
            | MessagingEvent::ChatBlocked { chat_id, .. }
            | MessagingEvent::ChatUnblocked { chat_id, .. }
            | MessagingEvent::ExpirationSet { chat_id, .. }
            | MessagingEvent::GroupInfoUpdated { chat_id, .. }
            | MessagingEvent::GroupMembersAdded { chat_id, .. }
            | MessagingEvent::GroupMembersRemoved { chat_id, .. } => *chat_id,
        }
    }

    pub fn sender_id(&self) -> Uuid {
        match self {
            MessagingEvent::TextMessageSent { sender_id, .. }
            | MessagingEvent::TextMessageEdited { sender_id, .. }
            | MessagingEvent::FileMessageSent { sender_id, .. }
            | MessagingEvent::ReactionSent { sender_id, .. }
            | MessagingEvent::UpdateDeleted { sender_id, .. }
            | MessagingEvent::SecretUpdateSent { sender_id, .. }
            | MessagingEvent::ChatCreated { sender_id, .. }
            | MessagingEvent::ChatDeleted { sender_id, .. }
            | MessagingEvent::ChatBlocked { sender_id, .. }
            | MessagingEvent::ChatUnblocked { sender_id, .. }
            | MessagingEvent::ExpirationSet { sender_id, .. }
            | MessagingEvent::GroupInfoUpdated { sender_id, .. }
            | MessagingEvent::GroupMembersAdded { sender_id, .. }
            | MessagingEvent::GroupMembersRemoved { sender_id, .. } => *sender_id,
        }
    }
}
