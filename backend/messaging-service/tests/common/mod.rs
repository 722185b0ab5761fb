#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use event_schema::MessagingEvent;
use messaging_service::config::Config;
use messaging_service::domain::{
    ChatId, Chatter, FileId, FileMeta, FixedClock, TextMessage, Url, UserId,
};
use messaging_service::external::{FileStorage, InMemoryFileStorage};
use messaging_service::publish::{EventPublisher, PublishError};
use messaging_service::request::{CreateGroup, CreatePersonalChat, SendTextMessage};
use messaging_service::storage::MemoryStore;
use messaging_service::AppState;
use std::sync::{Arc, Mutex};

/// Keeps every published event with its audience.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(Vec<UserId>, MessagingEvent)>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(Vec<UserId>, MessagingEvent)> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<(Vec<UserId>, MessagingEvent)> {
        self.events().pop()
    }

    pub fn count(&self) -> usize {
        self.published.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_for_users(
        &self,
        users: &[UserId],
        event: MessagingEvent,
    ) -> Result<(), PublishError> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((users.to_vec(), event));
        Ok(())
    }
}

pub struct Harness {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    pub files: Arc<InMemoryFileStorage>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

pub fn harness() -> Harness {
    harness_with(Config::default())
}

pub fn harness_with(config: Config) -> Harness {
    let clock = Arc::new(FixedClock::new(start_time()));
    let files = Arc::new(InMemoryFileStorage::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let state = AppState::new(
        config,
        MemoryStore::new(),
        files.clone(),
        publisher.clone(),
        clock.clone(),
    );
    Harness {
        state,
        clock,
        files,
        publisher,
    }
}

/// Builds state around arbitrary collaborators, e.g. mocks.
pub fn state_with(
    files: Arc<dyn FileStorage>,
    publisher: Arc<dyn EventPublisher>,
) -> AppState {
    AppState::new(
        Config::default(),
        MemoryStore::new(),
        files,
        publisher,
        Arc::new(FixedClock::new(start_time())),
    )
}

pub fn file(mime_type: &str, file_size: u64) -> FileMeta {
    let file_id = FileId::new();
    FileMeta {
        file_id,
        file_name: format!("{file_id}.bin"),
        mime_type: mime_type.to_string(),
        file_size,
        file_url: Url::new(format!("https://files.test/{file_id}")),
        created_at: start_time(),
    }
}

pub async fn personal_chat(state: &AppState, a: UserId, b: UserId) -> ChatId {
    state
        .router
        .create_personal_chat(CreatePersonalChat {
            sender_id: a,
            member_id: b,
        })
        .await
        .unwrap()
        .chat_id()
}

pub async fn secret_personal_chat(state: &AppState, a: UserId, b: UserId) -> ChatId {
    state
        .router
        .create_secret_personal_chat(CreatePersonalChat {
            sender_id: a,
            member_id: b,
        })
        .await
        .unwrap()
        .chat_id()
}

pub async fn group(state: &AppState, admin: UserId, members: &[UserId]) -> ChatId {
    state
        .router
        .create_group(CreateGroup {
            sender_id: admin,
            members: members.to_vec(),
            name: "Team".into(),
        })
        .await
        .unwrap()
        .chat_id()
}

pub async fn secret_group(state: &AppState, admin: UserId, members: &[UserId]) -> ChatId {
    state
        .router
        .create_secret_group(CreateGroup {
            sender_id: admin,
            members: members.to_vec(),
            name: "Vault".into(),
        })
        .await
        .unwrap()
        .chat_id()
}

pub fn text(chat_id: ChatId, sender_id: UserId, text: &str) -> SendTextMessage {
    SendTextMessage {
        chat_id,
        sender_id,
        text: text.to_string(),
        reply_to_message: None,
    }
}

pub async fn send_text(state: &AppState, chat_id: ChatId, sender: UserId, body: &str) -> TextMessage {
    state
        .router
        .send_text_message(text(chat_id, sender, body))
        .await
        .unwrap()
}
