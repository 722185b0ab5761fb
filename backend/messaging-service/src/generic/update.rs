use crate::domain::{
    AnyUpdate, ChatId, DeleteMode, Deletion, FileMessage, Reaction, SecretUpdate, TextMessage,
    TextMessageEdited, Timestamp, UpdateBase, UpdateId, UpdateType, UserId,
};
use crate::publish::events::file_info;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use event_schema::FileInfo;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericUpdate {
    pub update_id: UpdateId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub content: UpdateContent,
}

impl GenericUpdate {
    pub fn update_type(&self) -> UpdateType {
        self.content.update_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditedRef {
    pub update_id: UpdateId,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum UpdateContent {
    TextMessage {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_to: Option<UpdateId>,
        forwarded: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        edited: Option<EditedRef>,
    },
    TextMessageEdited {
        message_id: UpdateId,
        new_text: String,
    },
    FileMessage {
        file: FileInfo,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_to: Option<UpdateId>,
        forwarded: bool,
    },
    Reaction {
        reaction: String,
        message_id: UpdateId,
    },
    #[serde(rename = "update_deleted")]
    Deleted {
        deleted_id: UpdateId,
        deleted_mode: DeleteMode,
    },
    #[serde(rename = "secret_update")]
    Secret {
        key_id: uuid::Uuid,
        /// base64
        payload: String,
        /// base64
        initialization_vector: String,
    },
}

impl UpdateContent {
    pub fn update_type(&self) -> UpdateType {
        match self {
            UpdateContent::TextMessage { .. } => UpdateType::TextMessage,
            UpdateContent::TextMessageEdited { .. } => UpdateType::TextMessageEdited,
            UpdateContent::FileMessage { .. } => UpdateType::FileMessage,
            UpdateContent::Reaction { .. } => UpdateType::Reaction,
            UpdateContent::Deleted { .. } => UpdateType::UpdateDeleted,
            UpdateContent::Secret { .. } => UpdateType::SecretUpdate,
        }
    }
}

fn header(base: &UpdateBase, content: UpdateContent) -> GenericUpdate {
    GenericUpdate {
        update_id: base.id,
        chat_id: base.chat_id,
        sender_id: base.sender_id,
        created_at: base.created_at,
        content,
    }
}

impl From<&TextMessage> for GenericUpdate {
    fn from(m: &TextMessage) -> Self {
        header(
            &m.base,
            UpdateContent::TextMessage {
                text: m.text.clone(),
                reply_to: m.reply_to,
                forwarded: m.forwarded,
                edited: m.edited.as_ref().map(|e| EditedRef {
                    update_id: e.base.id,
                    new_text: e.new_text.clone(),
                }),
            },
        )
    }
}

impl From<&TextMessageEdited> for GenericUpdate {
    fn from(e: &TextMessageEdited) -> Self {
        header(
            &e.base,
            UpdateContent::TextMessageEdited {
                message_id: e.message_id,
                new_text: e.new_text.clone(),
            },
        )
    }
}

impl From<&FileMessage> for GenericUpdate {
    fn from(m: &FileMessage) -> Self {
        header(
            &m.base,
            UpdateContent::FileMessage {
                file: file_info(&m.file),
                reply_to: m.reply_to,
                forwarded: m.forwarded,
            },
        )
    }
}

impl From<&Reaction> for GenericUpdate {
    fn from(r: &Reaction) -> Self {
        header(
            &r.base,
            UpdateContent::Reaction {
                reaction: r.reaction_type.to_string(),
                message_id: r.message_id,
            },
        )
    }
}

impl From<&Deletion> for GenericUpdate {
    fn from(d: &Deletion) -> Self {
        header(
            &d.base,
            UpdateContent::Deleted {
                deleted_id: d.deleted_id,
                deleted_mode: d.mode,
            },
        )
    }
}

impl From<&SecretUpdate> for GenericUpdate {
    fn from(u: &SecretUpdate) -> Self {
        header(
            &u.base,
            UpdateContent::Secret {
                key_id: u.data.key_id.as_uuid(),
                payload: STANDARD.encode(&u.data.payload),
                initialization_vector: STANDARD.encode(&u.data.initialization_vector),
            },
        )
    }
}

impl From<&AnyUpdate> for GenericUpdate {
    fn from(update: &AnyUpdate) -> Self {
        match update {
            AnyUpdate::TextMessage(u) => u.into(),
            AnyUpdate::TextMessageEdited(u) => u.into(),
            AnyUpdate::FileMessage(u) => u.into(),
            AnyUpdate::Reaction(u) => u.into(),
            AnyUpdate::Deletion(u) => u.into(),
            AnyUpdate::SecretUpdate(u) => u.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, PersonalChat, SystemClock};

    #[test]
    fn text_message_projection() {
        let (a, b) = (UserId::new(), UserId::new());
        let chat = PersonalChat::new(&SystemClock, [a, b]).unwrap();
        let mut msg = TextMessage::new(&chat, a, "hi", None, &SystemClock).unwrap();
        msg.base.id = UpdateId::new(1);

        let generic = GenericUpdate::from(&AnyUpdate::TextMessage(msg.clone()));
        assert_eq!(generic.update_type(), UpdateType::TextMessage);
        assert_eq!(generic.update_id, UpdateId::new(1));

        let json = serde_json::to_value(&generic).unwrap();
        assert_eq!(json["type"], "text_message");
        assert_eq!(json["content"]["text"], "hi");
        assert!(json["content"].get("reply_to").is_none());

        let mut reaction =
            Reaction::new(&chat, b, &Message::Text(msg), "thunder", &SystemClock).unwrap();
        reaction.base.id = UpdateId::new(2);
        let json = serde_json::to_value(GenericUpdate::from(&reaction)).unwrap();
        assert_eq!(json["type"], "reaction");
        assert_eq!(json["content"]["reaction"], "thunder");
        assert_eq!(json["content"]["message_id"], 1);
    }

    #[test]
    fn deletion_projection_uses_wire_names() {
        let (a, b) = (UserId::new(), UserId::new());
        let chat = PersonalChat::new(&SystemClock, [a, b]).unwrap();
        let mut msg = TextMessage::new(&chat, a, "hi", None, &SystemClock).unwrap();
        msg.base.id = UpdateId::new(1);
        let deletion = msg
            .base
            .delete(&chat, a, DeleteMode::ForAll, &SystemClock)
            .unwrap();

        let json = serde_json::to_value(GenericUpdate::from(&deletion)).unwrap();
        assert_eq!(json["type"], "update_deleted");
        assert_eq!(json["content"]["deleted_mode"], "for_all");
        assert_eq!(json["content"]["deleted_id"], 1);
    }
}
