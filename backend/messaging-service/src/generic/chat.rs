use super::GenericUpdate;
use crate::domain::{
    Chat, ChatId, ChatType, Chatter, GroupChat, GroupCore, PersonalChat, SecretGroupChat,
    SecretPersonalChat, Timestamp, UpdateId, UserId,
};
use chrono::Duration;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericChat {
    pub chat_id: ChatId,
    pub created_at: Timestamp,
    pub members: Vec<UserId>,
    #[serde(flatten)]
    pub info: ChatInfo,
    /// May point at an update the viewer cannot see.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_id: Option<UpdateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_preview: Option<Vec<GenericUpdate>>,
}

impl GenericChat {
    pub fn chat_type(&self) -> ChatType {
        self.info.chat_type()
    }
}

/// Variant-specific chat details; the serialized `type` tag selects the one
/// populated `info` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "info", rename_all = "snake_case")]
pub enum ChatInfo {
    Personal {
        blocked_by: Vec<UserId>,
    },
    Group {
        admin_id: UserId,
        name: String,
        description: String,
        group_photo: Option<String>,
    },
    SecretPersonal {
        expiration_seconds: Option<i64>,
    },
    SecretGroup {
        admin_id: UserId,
        name: String,
        description: String,
        group_photo: Option<String>,
        expiration_seconds: Option<i64>,
    },
}

impl ChatInfo {
    pub fn chat_type(&self) -> ChatType {
        match self {
            ChatInfo::Personal { .. } => ChatType::Personal,
            ChatInfo::Group { .. } => ChatType::Group,
            ChatInfo::SecretPersonal { .. } => ChatType::SecretPersonal,
            ChatInfo::SecretGroup { .. } => ChatType::SecretGroup,
        }
    }
}

fn seconds(expiration: Option<Duration>) -> Option<i64> {
    expiration.map(|exp| exp.num_seconds())
}

fn photo(core: &GroupCore) -> Option<String> {
    core.photo.as_ref().map(|p| p.to_string())
}

fn base(chat: &dyn Chatter, info: ChatInfo) -> GenericChat {
    GenericChat {
        chat_id: chat.chat_id(),
        created_at: chat.meta().created_at,
        members: chat.members().to_vec(),
        info,
        last_update_id: None,
        update_preview: None,
    }
}

impl From<&PersonalChat> for GenericChat {
    fn from(chat: &PersonalChat) -> Self {
        base(
            chat,
            ChatInfo::Personal {
                blocked_by: chat.blocked_by.clone(),
            },
        )
    }
}

impl From<&GroupChat> for GenericChat {
    fn from(chat: &GroupChat) -> Self {
        base(
            chat,
            ChatInfo::Group {
                admin_id: chat.core.admin,
                name: chat.core.name.clone(),
                description: chat.core.description.clone(),
                group_photo: photo(&chat.core),
            },
        )
    }
}

impl From<&SecretPersonalChat> for GenericChat {
    fn from(chat: &SecretPersonalChat) -> Self {
        base(
            chat,
            ChatInfo::SecretPersonal {
                expiration_seconds: seconds(chat.expiration),
            },
        )
    }
}

impl From<&SecretGroupChat> for GenericChat {
    fn from(chat: &SecretGroupChat) -> Self {
        base(
            chat,
            ChatInfo::SecretGroup {
                admin_id: chat.core.admin,
                name: chat.core.name.clone(),
                description: chat.core.description.clone(),
                group_photo: photo(&chat.core),
                expiration_seconds: seconds(chat.expiration),
            },
        )
    }
}

impl From<&Chat> for GenericChat {
    fn from(chat: &Chat) -> Self {
        match chat {
            Chat::Personal(c) => c.into(),
            Chat::Group(c) => c.into(),
            Chat::SecretPersonal(c) => c.into(),
            Chat::SecretGroup(c) => c.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupChatter, SystemClock, Url};

    #[test]
    fn personal_chat_projection() {
        let (a, b) = (UserId::new(), UserId::new());
        let mut chat = PersonalChat::new(&SystemClock, [a, b]).unwrap();
        chat.block_by(b).unwrap();

        let generic = GenericChat::from(&Chat::from(chat.clone()));
        assert_eq!(generic.chat_type(), ChatType::Personal);
        assert_eq!(generic.members, vec![a, b]);
        assert_eq!(generic.info, ChatInfo::Personal { blocked_by: vec![b] });

        let json = serde_json::to_value(&generic).unwrap();
        assert_eq!(json["type"], "personal");
        assert_eq!(json["info"]["blocked_by"][0], b.to_string());
        assert!(json.get("last_update_id").is_none());
    }

    #[test]
    fn secret_group_projection_carries_every_field() {
        let admin = UserId::new();
        let mut chat = SecretGroupChat::new(&SystemClock, admin, vec![admin], "Vault").unwrap();
        chat.update_photo(admin, Url::new("https://cdn/v.png")).unwrap();
        chat.set_expiration(admin, Some(Duration::hours(1))).unwrap();

        let json = serde_json::to_value(GenericChat::from(&chat)).unwrap();
        assert_eq!(json["type"], "secret_group");
        assert_eq!(json["info"]["name"], "Vault");
        assert_eq!(json["info"]["group_photo"], "https://cdn/v.png");
        assert_eq!(json["info"]["expiration_seconds"], 3600);
    }
}
