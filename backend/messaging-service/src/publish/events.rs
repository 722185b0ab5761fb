//! Builders turning committed domain state into fan-out events.

use crate::domain::{
    ChatId, Chatter, Deletion, FileMessage, FileMeta, GroupChatter, Reaction, SecretUpdate,
    TextMessage, TextMessageEdited, UserId,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Duration;
use event_schema::{FileInfo, MessagingEvent};

pub fn text_message_sent(message: &TextMessage) -> MessagingEvent {
    MessagingEvent::TextMessageSent {
        chat_id: message.base.chat_id.as_uuid(),
        update_id: message.base.id.value(),
        sender_id: message.base.sender_id.as_uuid(),
        created_at: message.base.created_at,
        text: message.text.clone(),
        reply_to: message.reply_to.map(|id| id.value()),
        forwarded: message.forwarded,
    }
}

pub fn text_message_edited(edited: &TextMessageEdited) -> MessagingEvent {
    MessagingEvent::TextMessageEdited {
        chat_id: edited.base.chat_id.as_uuid(),
        update_id: edited.base.id.value(),
        message_id: edited.message_id.value(),
        sender_id: edited.base.sender_id.as_uuid(),
        created_at: edited.base.created_at,
        new_text: edited.new_text.clone(),
    }
}

pub fn file_info(file: &FileMeta) -> FileInfo {
    FileInfo {
        file_id: file.file_id.as_uuid(),
        file_name: file.file_name.clone(),
        mime_type: file.mime_type.clone(),
        file_size: file.file_size,
        file_url: file.file_url.to_string(),
    }
}

pub fn file_message_sent(message: &FileMessage) -> MessagingEvent {
    MessagingEvent::FileMessageSent {
        chat_id: message.base.chat_id.as_uuid(),
        update_id: message.base.id.value(),
        sender_id: message.base.sender_id.as_uuid(),
        created_at: message.base.created_at,
        file: file_info(&message.file),
        reply_to: message.reply_to.map(|id| id.value()),
        forwarded: message.forwarded,
    }
}

pub fn reaction_sent(reaction: &Reaction) -> MessagingEvent {
    MessagingEvent::ReactionSent {
        chat_id: reaction.base.chat_id.as_uuid(),
        update_id: reaction.base.id.value(),
        sender_id: reaction.base.sender_id.as_uuid(),
        created_at: reaction.base.created_at,
        reaction_type: reaction.reaction_type.to_string(),
        message_id: reaction.message_id.value(),
    }
}

pub fn update_deleted(deletion: &Deletion) -> MessagingEvent {
    MessagingEvent::UpdateDeleted {
        chat_id: deletion.base.chat_id.as_uuid(),
        update_id: deletion.base.id.value(),
        sender_id: deletion.base.sender_id.as_uuid(),
        created_at: deletion.base.created_at,
        deleted_id: deletion.deleted_id.value(),
        mode: deletion.mode.as_str().to_string(),
    }
}

pub fn secret_update_sent(update: &SecretUpdate) -> MessagingEvent {
    MessagingEvent::SecretUpdateSent {
        chat_id: update.base.chat_id.as_uuid(),
        update_id: update.base.id.value(),
        sender_id: update.base.sender_id.as_uuid(),
        created_at: update.base.created_at,
        key_id: update.data.key_id.as_uuid(),
        payload: STANDARD.encode(&update.data.payload),
        initialization_vector: STANDARD.encode(&update.data.initialization_vector),
    }
}

pub fn chat_created(chat: &dyn Chatter, sender: UserId) -> MessagingEvent {
    MessagingEvent::ChatCreated {
        chat_id: chat.chat_id().as_uuid(),
        sender_id: sender.as_uuid(),
        chat_type: chat.chat_type().to_string(),
        members: chat.members().iter().map(|m| m.as_uuid()).collect(),
    }
}

pub fn chat_deleted(chat_id: ChatId, sender: UserId) -> MessagingEvent {
    MessagingEvent::ChatDeleted {
        chat_id: chat_id.as_uuid(),
        sender_id: sender.as_uuid(),
    }
}

pub fn chat_blocked(chat_id: ChatId, sender: UserId) -> MessagingEvent {
    MessagingEvent::ChatBlocked {
        chat_id: chat_id.as_uuid(),
        sender_id: sender.as_uuid(),
    }
}

pub fn chat_unblocked(chat_id: ChatId, sender: UserId) -> MessagingEvent {
    MessagingEvent::ChatUnblocked {
        chat_id: chat_id.as_uuid(),
        sender_id: sender.as_uuid(),
    }
}

pub fn expiration_set(chat_id: ChatId, sender: UserId, expiration: Option<Duration>) -> MessagingEvent {
    MessagingEvent::ExpirationSet {
        chat_id: chat_id.as_uuid(),
        sender_id: sender.as_uuid(),
        expiration_seconds: expiration.map(|exp| exp.num_seconds()),
    }
}

pub fn group_info_updated<G: GroupChatter>(chat: &G, sender: UserId) -> MessagingEvent {
    let core = chat.core();
    MessagingEvent::GroupInfoUpdated {
        chat_id: chat.chat_id().as_uuid(),
        sender_id: sender.as_uuid(),
        name: core.name.clone(),
        description: core.description.clone(),
        group_photo: core.photo.as_ref().map(|p| p.to_string()),
    }
}

pub fn group_members_added(chat_id: ChatId, sender: UserId, members: &[UserId]) -> MessagingEvent {
    MessagingEvent::GroupMembersAdded {
        chat_id: chat_id.as_uuid(),
        sender_id: sender.as_uuid(),
        members: members.iter().map(|m| m.as_uuid()).collect(),
    }
}

pub fn group_members_removed(chat_id: ChatId, sender: UserId, members: &[UserId]) -> MessagingEvent {
    MessagingEvent::GroupMembersRemoved {
        chat_id: chat_id.as_uuid(),
        sender_id: sender.as_uuid(),
        members: members.iter().map(|m| m.as_uuid()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SecretData, SecretKeyId, SecretPersonalChat, SystemClock};

    #[test]
    fn secret_payload_is_base64_encoded() {
        let (a, b) = (UserId::new(), UserId::new());
        let chat = SecretPersonalChat::new(&SystemClock, [a, b]).unwrap();
        let update = SecretUpdate::new(
            &chat,
            a,
            SecretData {
                key_id: SecretKeyId::new(),
                payload: b"cipher".to_vec(),
                initialization_vector: vec![0, 1, 2],
            },
            &SystemClock,
        )
        .unwrap();

        match secret_update_sent(&update) {
            MessagingEvent::SecretUpdateSent {
                payload,
                initialization_vector,
                ..
            } => {
                assert_eq!(payload, "Y2lwaGVy");
                assert_eq!(initialization_vector, "AAEC");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn expiration_is_sent_in_seconds() {
        let event = expiration_set(ChatId::new(), UserId::new(), Some(Duration::minutes(2)));
        assert!(matches!(
            event,
            MessagingEvent::ExpirationSet {
                expiration_seconds: Some(120),
                ..
            }
        ));
    }
}
