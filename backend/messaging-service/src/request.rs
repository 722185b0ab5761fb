//! Inbound operation payloads, as bound by the transport layer.

use crate::domain::{ChatId, DeleteMode, FileId, SecretKeyId, UpdateId, UserId};
use chrono::Duration;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SendTextMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: String,
    pub reply_to_message: Option<UpdateId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditTextMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub message_id: UpdateId,
    pub new_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub message_id: UpdateId,
    pub mode: DeleteMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendReaction {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub message_id: UpdateId,
    pub reaction_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteReaction {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub reaction_id: UpdateId,
}

/// Dispatched on the destination chat's type.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardMessage {
    pub to_chat_id: ChatId,
    pub from_chat_id: ChatId,
    pub sender_id: UserId,
    pub message_id: UpdateId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendFileMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub file_id: FileId,
    pub reply_to_message: Option<UpdateId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendSecretUpdate {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub key_id: SecretKeyId,
    pub payload: Vec<u8>,
    pub initialization_vector: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSecretUpdate {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub secret_update_id: UpdateId,
    pub mode: DeleteMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePersonalChat {
    pub sender_id: UserId,
    pub member_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroup {
    pub sender_id: UserId,
    pub members: Vec<UserId>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGroupInfo {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGroupPhoto {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub file_id: FileId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupMember {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub member_id: UserId,
}

#[derive(Debug, Clone)]
pub struct SetExpiration {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub expiration: Option<Duration>,
}

/// Operations that only name a chat and the acting user: block, unblock,
/// delete photo, delete chat.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChatAction {
    pub chat_id: ChatId,
    pub sender_id: UserId,
}
