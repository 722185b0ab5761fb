//! In-process store backing every repository trait.
//!
//! Transactions take the store-wide write lock, work on a private copy of the
//! data and swap it in on commit. Dropping an uncommitted transaction simply
//! drops the copy.

use super::repository::{
    ChatRepository, ChatterRepository, FetchLastOptions, GenericChatRepository,
    GenericUpdateRepository, PairChatRepository, SecretUpdateRepository, UpdateRepository,
};
use super::{StorageError, Transaction, TransactionProvider};
use crate::domain::{
    AnyUpdate, Chat, ChatId, ChatType, Chatter, Deletion, FileMessage, GroupChat, Message,
    PairChatter, PersonalChat, Reaction, SecretGroupChat, SecretPersonalChat, SecretUpdate,
    TextMessage, TextMessageEdited, UpdateId, Updater, UserId,
};
use async_trait::async_trait;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default, Clone)]
struct ChatLog {
    last_id: UpdateId,
    updates: BTreeMap<UpdateId, AnyUpdate>,
}

impl ChatLog {
    fn append(&mut self, mut update: AnyUpdate) -> UpdateId {
        let id = self.last_id.next();
        update.base_mut().id = id;
        self.last_id = id;
        self.updates.insert(id, update);
        id
    }
}

#[derive(Debug, Default, Clone)]
struct StoreData {
    chats: HashMap<ChatId, Chat>,
    logs: HashMap<ChatId, ChatLog>,
}

impl StoreData {
    fn log(&self, chat_id: ChatId) -> Result<&ChatLog, StorageError> {
        self.logs.get(&chat_id).ok_or(StorageError::NotFound)
    }

    fn log_mut(&mut self, chat_id: ChatId) -> Result<&mut ChatLog, StorageError> {
        self.logs.get_mut(&chat_id).ok_or(StorageError::NotFound)
    }

    fn find_update(&self, chat_id: ChatId, id: UpdateId) -> Result<&AnyUpdate, StorageError> {
        self.log(chat_id)?
            .updates
            .get(&id)
            .ok_or(StorageError::NotFound)
    }

    fn create_deletion(&mut self, deletion: &mut Deletion) -> Result<(), StorageError> {
        let log = self.log_mut(deletion.base.chat_id)?;
        if !log.updates.contains_key(&deletion.deleted_id) {
            return Err(StorageError::NotFound);
        }
        deletion.base.id = log.append(AnyUpdate::Deletion(deletion.clone()));
        if let Some(target) = log.updates.get_mut(&deletion.deleted_id) {
            target.base_mut().add_deletion(deletion.clone());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<StoreData>>,
}

struct MemoryTx {
    store: usize,
    guard: OwnedMutexGuard<StoreData>,
    working: StoreData,
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }

    fn working<'a>(&self, tx: &'a mut dyn Transaction) -> Result<&'a mut StoreData, StorageError> {
        let tx = tx
            .as_any_mut()
            .downcast_mut::<MemoryTx>()
            .ok_or(StorageError::ForeignTransaction)?;
        if tx.store != self.id() {
            return Err(StorageError::ForeignTransaction);
        }
        Ok(&mut tx.working)
    }
}

#[async_trait]
impl TransactionProvider for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StorageError> {
        let guard = self.data.clone().lock_owned().await;
        let working = (*guard).clone();
        tracing::debug!("transaction started");
        Ok(Box::new(MemoryTx {
            store: self.id(),
            guard,
            working,
        }))
    }
}

/// Maps one chat variant onto the shared chat table.
pub trait StoredChat: Chatter + Clone + Send + Sync + 'static {
    fn from_chat(chat: &Chat) -> Option<&Self>;
}

impl StoredChat for PersonalChat {
    fn from_chat(chat: &Chat) -> Option<&Self> {
        match chat {
            Chat::Personal(c) => Some(c),
            _ => None,
        }
    }
}

impl StoredChat for GroupChat {
    fn from_chat(chat: &Chat) -> Option<&Self> {
        match chat {
            Chat::Group(c) => Some(c),
            _ => None,
        }
    }
}

impl StoredChat for SecretPersonalChat {
    fn from_chat(chat: &Chat) -> Option<&Self> {
        match chat {
            Chat::SecretPersonal(c) => Some(c),
            _ => None,
        }
    }
}

impl StoredChat for SecretGroupChat {
    fn from_chat(chat: &Chat) -> Option<&Self> {
        match chat {
            Chat::SecretGroup(c) => Some(c),
            _ => None,
        }
    }
}

#[async_trait]
impl<C> ChatRepository<C> for MemoryStore
where
    C: StoredChat,
    Chat: From<C>,
{
    async fn find_by_id(&self, tx: &mut dyn Transaction, id: ChatId) -> Result<C, StorageError> {
        let data = self.working(tx)?;
        data.chats
            .get(&id)
            .and_then(C::from_chat)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn create(&self, tx: &mut dyn Transaction, chat: &C) -> Result<(), StorageError> {
        let data = self.working(tx)?;
        let id = chat.chat_id();
        if data.chats.contains_key(&id) {
            return Err(StorageError::Backend(format!("chat {id} already stored")));
        }
        data.chats.insert(id, Chat::from(chat.clone()));
        data.logs.insert(id, ChatLog::default());
        Ok(())
    }

    async fn update(&self, tx: &mut dyn Transaction, chat: &mut C) -> Result<(), StorageError> {
        let data = self.working(tx)?;
        let id = chat.chat_id();
        let stored = data
            .chats
            .get(&id)
            .and_then(C::from_chat)
            .ok_or(StorageError::NotFound)?;
        if stored.meta().version != chat.meta().version {
            return Err(StorageError::VersionConflict { chat_id: id });
        }
        chat.meta_mut().version += 1;
        data.chats.insert(id, Chat::from(chat.clone()));
        Ok(())
    }

    async fn delete(&self, tx: &mut dyn Transaction, id: ChatId) -> Result<(), StorageError> {
        let data = self.working(tx)?;
        if data.chats.get(&id).and_then(C::from_chat).is_none() {
            return Err(StorageError::NotFound);
        }
        data.chats.remove(&id);
        data.logs.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl<C> PairChatRepository<C> for MemoryStore
where
    C: StoredChat + PairChatter,
    Chat: From<C>,
{
    async fn find_by_members(
        &self,
        tx: &mut dyn Transaction,
        members: [UserId; 2],
    ) -> Result<C, StorageError> {
        let data = self.working(tx)?;
        let wanted = sorted_pair(members);
        data.chats
            .values()
            .filter_map(C::from_chat)
            .find(|chat| sorted_pair(chat.pair()) == wanted)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

fn sorted_pair(mut pair: [UserId; 2]) -> [UserId; 2] {
    pair.sort();
    pair
}

#[async_trait]
impl ChatterRepository for MemoryStore {
    async fn find_chatter(
        &self,
        tx: &mut dyn Transaction,
        id: ChatId,
    ) -> Result<Chat, StorageError> {
        let data = self.working(tx)?;
        data.chats.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl GenericChatRepository for MemoryStore {
    async fn get_by_member_id(
        &self,
        tx: &mut dyn Transaction,
        member: UserId,
    ) -> Result<Vec<Chat>, StorageError> {
        let data = self.working(tx)?;
        let mut chats: Vec<Chat> = data
            .chats
            .values()
            .filter(|chat| chat.is_member(member))
            .cloned()
            .collect();
        chats.sort_by_key(|chat| (chat.meta().created_at, chat.chat_id()));
        Ok(chats)
    }

    async fn get_by_chat_id(
        &self,
        tx: &mut dyn Transaction,
        id: ChatId,
    ) -> Result<Chat, StorageError> {
        let data = self.working(tx)?;
        data.chats.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn get_chat_type(
        &self,
        tx: &mut dyn Transaction,
        id: ChatId,
    ) -> Result<ChatType, StorageError> {
        let data = self.working(tx)?;
        data.chats
            .get(&id)
            .map(|chat| chat.chat_type())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl UpdateRepository for MemoryStore {
    async fn find_message(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<Message, StorageError> {
        let data = self.working(tx)?;
        data.find_update(chat_id, id)?
            .clone()
            .into_message()
            .ok_or(StorageError::NotFound)
    }

    async fn find_text_message(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<TextMessage, StorageError> {
        let data = self.working(tx)?;
        match data.find_update(chat_id, id)? {
            AnyUpdate::TextMessage(m) => Ok(m.clone()),
            _ => Err(StorageError::NotFound),
        }
    }

    async fn find_file_message(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<FileMessage, StorageError> {
        let data = self.working(tx)?;
        match data.find_update(chat_id, id)? {
            AnyUpdate::FileMessage(m) => Ok(m.clone()),
            _ => Err(StorageError::NotFound),
        }
    }

    async fn find_reaction(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<Reaction, StorageError> {
        let data = self.working(tx)?;
        match data.find_update(chat_id, id)? {
            AnyUpdate::Reaction(r) => Ok(r.clone()),
            _ => Err(StorageError::NotFound),
        }
    }

    async fn create_text_message(
        &self,
        tx: &mut dyn Transaction,
        message: &mut TextMessage,
    ) -> Result<(), StorageError> {
        let log = self.working(tx)?.log_mut(message.base.chat_id)?;
        message.base.id = log.append(AnyUpdate::TextMessage(message.clone()));
        Ok(())
    }

    async fn update_text_message(
        &self,
        tx: &mut dyn Transaction,
        message: &TextMessage,
    ) -> Result<(), StorageError> {
        let log = self.working(tx)?.log_mut(message.base.chat_id)?;
        match log.updates.get_mut(&message.base.id) {
            Some(AnyUpdate::TextMessage(stored)) => {
                *stored = message.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn create_text_message_edited(
        &self,
        tx: &mut dyn Transaction,
        edited: &mut TextMessageEdited,
    ) -> Result<(), StorageError> {
        let log = self.working(tx)?.log_mut(edited.base.chat_id)?;
        edited.base.id = log.append(AnyUpdate::TextMessageEdited(edited.clone()));
        Ok(())
    }

    async fn create_file_message(
        &self,
        tx: &mut dyn Transaction,
        message: &mut FileMessage,
    ) -> Result<(), StorageError> {
        let log = self.working(tx)?.log_mut(message.base.chat_id)?;
        message.base.id = log.append(AnyUpdate::FileMessage(message.clone()));
        Ok(())
    }

    async fn create_reaction(
        &self,
        tx: &mut dyn Transaction,
        reaction: &mut Reaction,
    ) -> Result<(), StorageError> {
        let log = self.working(tx)?.log_mut(reaction.base.chat_id)?;
        reaction.base.id = log.append(AnyUpdate::Reaction(reaction.clone()));
        Ok(())
    }

    async fn create_update_deleted(
        &self,
        tx: &mut dyn Transaction,
        deletion: &mut Deletion,
    ) -> Result<(), StorageError> {
        self.working(tx)?.create_deletion(deletion)
    }
}

#[async_trait]
impl SecretUpdateRepository for MemoryStore {
    async fn find_secret_update(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<SecretUpdate, StorageError> {
        let data = self.working(tx)?;
        match data.find_update(chat_id, id)? {
            AnyUpdate::SecretUpdate(u) => Ok(u.clone()),
            _ => Err(StorageError::NotFound),
        }
    }

    async fn create_secret_update(
        &self,
        tx: &mut dyn Transaction,
        update: &mut SecretUpdate,
    ) -> Result<(), StorageError> {
        let log = self.working(tx)?.log_mut(update.base.chat_id)?;
        update.base.id = log.append(AnyUpdate::SecretUpdate(update.clone()));
        Ok(())
    }

    async fn create_update_deleted(
        &self,
        tx: &mut dyn Transaction,
        deletion: &mut Deletion,
    ) -> Result<(), StorageError> {
        self.working(tx)?.create_deletion(deletion)
    }
}

#[async_trait]
impl GenericUpdateRepository for MemoryStore {
    async fn get_last_update_id(
        &self,
        tx: &mut dyn Transaction,
        chat_id: ChatId,
    ) -> Result<UpdateId, StorageError> {
        let log = self.working(tx)?.log(chat_id)?;
        if !log.last_id.is_assigned() {
            return Err(StorageError::NotFound);
        }
        Ok(log.last_id)
    }

    async fn get_range(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat_id: ChatId,
        from: UpdateId,
        to: UpdateId,
    ) -> Result<Vec<AnyUpdate>, StorageError> {
        let log = self.working(tx)?.log(chat_id)?;
        if from > to {
            return Ok(Vec::new());
        }
        Ok(log
            .updates
            .range(from..=to)
            .map(|(_, update)| update)
            .filter(|update| update.visible_to(viewer))
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat_id: ChatId,
        id: UpdateId,
    ) -> Result<AnyUpdate, StorageError> {
        let data = self.working(tx)?;
        let update = data.find_update(chat_id, id)?;
        if !update.visible_to(viewer) {
            return Err(StorageError::NotFound);
        }
        Ok(update.clone())
    }

    async fn fetch_last(
        &self,
        tx: &mut dyn Transaction,
        viewer: UserId,
        chat_id: ChatId,
        opts: FetchLastOptions,
    ) -> Result<Vec<AnyUpdate>, StorageError> {
        let log = self.working(tx)?.log(chat_id)?;
        let mut counted = 0;
        let mut fetched = Vec::new();
        for update in log.updates.values().rev() {
            if counted >= opts.count {
                break;
            }
            if !update.visible_to(viewer) {
                continue;
            }
            if opts.mode.counts(update) {
                counted += 1;
            }
            fetched.push(update.clone());
        }
        fetched.reverse();
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeleteMode, SystemClock};
    use crate::storage::repository::FetchLastMode;

    fn personal() -> (PersonalChat, UserId, UserId) {
        let (a, b) = (UserId::new(), UserId::new());
        (PersonalChat::new(&SystemClock, [a, b]).unwrap(), a, b)
    }

    async fn seeded(store: &MemoryStore, chat: &PersonalChat) {
        let mut tx = store.begin().await.unwrap();
        ChatRepository::<PersonalChat>::create(store, tx.as_mut(), chat)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    async fn send(store: &MemoryStore, chat: &PersonalChat, sender: UserId, text: &str) -> TextMessage {
        let mut tx = store.begin().await.unwrap();
        let mut msg = TextMessage::new(chat, sender, text, None, &SystemClock).unwrap();
        store.create_text_message(tx.as_mut(), &mut msg).await.unwrap();
        tx.commit().await.unwrap();
        msg
    }

    #[tokio::test]
    async fn update_ids_are_monotonic_per_chat() {
        let store = MemoryStore::new();
        let (chat, a, b) = personal();
        let (other, c, _) = personal();
        seeded(&store, &chat).await;
        seeded(&store, &other).await;

        assert_eq!(send(&store, &chat, a, "1").await.base.id, UpdateId::new(1));
        assert_eq!(send(&store, &chat, b, "2").await.base.id, UpdateId::new(2));
        assert_eq!(send(&store, &other, c, "x").await.base.id, UpdateId::new(1));
        assert_eq!(send(&store, &chat, a, "3").await.base.id, UpdateId::new(3));
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let (chat, _, _) = personal();
        {
            let mut tx = store.begin().await.unwrap();
            ChatRepository::<PersonalChat>::create(&store, tx.as_mut(), &chat)
                .await
                .unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        let found = ChatRepository::<PersonalChat>::find_by_id(&store, tx.as_mut(), chat.chat_id()).await;
        assert_eq!(found, Err(StorageError::NotFound));
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = MemoryStore::new();
        let (chat, _, _) = personal();
        let mut tx = store.begin().await.unwrap();
        ChatRepository::<PersonalChat>::create(&store, tx.as_mut(), &chat)
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(store.find_chatter(tx.as_mut(), chat.chat_id()).await.is_err());
    }

    #[tokio::test]
    async fn stale_update_is_rejected() {
        let store = MemoryStore::new();
        let (chat, a, _) = personal();
        seeded(&store, &chat).await;

        let mut tx = store.begin().await.unwrap();
        let mut fresh: PersonalChat = store.find_by_id(tx.as_mut(), chat.chat_id()).await.unwrap();
        let mut stale = fresh.clone();

        fresh.block_by(a).unwrap();
        store.update(tx.as_mut(), &mut fresh).await.unwrap();
        assert_eq!(fresh.meta.version, 1);

        stale.block_by(a).unwrap();
        assert_eq!(
            store.update(tx.as_mut(), &mut stale).await,
            Err(StorageError::VersionConflict {
                chat_id: chat.chat_id()
            })
        );
    }

    #[tokio::test]
    async fn find_by_members_ignores_order_and_variant() {
        let store = MemoryStore::new();
        let (chat, a, b) = personal();
        seeded(&store, &chat).await;

        let mut tx = store.begin().await.unwrap();
        let found: PersonalChat = store.find_by_members(tx.as_mut(), [b, a]).await.unwrap();
        assert_eq!(found.chat_id(), chat.chat_id());

        let secret: Result<SecretPersonalChat, _> = store.find_by_members(tx.as_mut(), [a, b]).await;
        assert_eq!(secret, Err(StorageError::NotFound));
    }

    #[tokio::test]
    async fn deletion_is_appended_to_target() {
        let store = MemoryStore::new();
        let (chat, a, b) = personal();
        seeded(&store, &chat).await;
        let msg = send(&store, &chat, a, "hi").await;

        let mut tx = store.begin().await.unwrap();
        let mut deletion = msg
            .base
            .delete(&chat, b, DeleteMode::ForSender, &SystemClock)
            .unwrap();
        UpdateRepository::create_update_deleted(&store, tx.as_mut(), &mut deletion)
            .await
            .unwrap();
        assert_eq!(deletion.base.id, UpdateId::new(2));

        let stored = store
            .find_text_message(tx.as_mut(), chat.chat_id(), msg.base.id)
            .await
            .unwrap();
        assert_eq!(stored.base.deletions, vec![deletion]);

        let for_a = store
            .get_range(tx.as_mut(), a, chat.chat_id(), UpdateId::new(1), UpdateId::new(10))
            .await
            .unwrap();
        assert_eq!(for_a.len(), 1);
        let for_b = store
            .get_range(tx.as_mut(), b, chat.chat_id(), UpdateId::new(1), UpdateId::new(10))
            .await
            .unwrap();
        assert_eq!(for_b.len(), 1);
        assert!(matches!(for_b[0], AnyUpdate::Deletion(_)));
    }

    #[tokio::test]
    async fn fetch_last_counts_by_mode() {
        let store = MemoryStore::new();
        let (chat, a, b) = personal();
        seeded(&store, &chat).await;
        let first = send(&store, &chat, a, "one").await;
        send(&store, &chat, b, "two").await;

        let mut tx = store.begin().await.unwrap();
        let target = Message::Text(first);
        let mut reaction = Reaction::new(&chat, b, &target, "like", &SystemClock).unwrap();
        store.create_reaction(tx.as_mut(), &mut reaction).await.unwrap();

        let last = store
            .fetch_last(tx.as_mut(), a, chat.chat_id(), FetchLastOptions::default().with_count(1))
            .await
            .unwrap();
        let ids: Vec<u64> = last.iter().map(|u| u.id().value()).collect();
        assert_eq!(ids, vec![2, 3]);

        let all = store
            .fetch_last(
                tx.as_mut(),
                a,
                chat.chat_id(),
                FetchLastOptions::default()
                    .with_count(1)
                    .with_mode(FetchLastMode::All),
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            store.get_last_update_id(tx.as_mut(), chat.chat_id()).await,
            Ok(UpdateId::new(3))
        );
    }

    #[tokio::test]
    async fn foreign_transaction_is_rejected() {
        let store = MemoryStore::new();
        let other = MemoryStore::new();
        let (chat, _, _) = personal();

        let mut tx = other.begin().await.unwrap();
        assert_eq!(
            store.find_chatter(tx.as_mut(), chat.chat_id()).await,
            Err(StorageError::ForeignTransaction)
        );
    }

    #[tokio::test]
    async fn deleting_chat_drops_its_log() {
        let store = MemoryStore::new();
        let (chat, a, _) = personal();
        seeded(&store, &chat).await;
        send(&store, &chat, a, "hi").await;

        let mut tx = store.begin().await.unwrap();
        ChatRepository::<PersonalChat>::delete(&store, tx.as_mut(), chat.chat_id())
            .await
            .unwrap();
        assert_eq!(
            store.get_last_update_id(tx.as_mut(), chat.chat_id()).await,
            Err(StorageError::NotFound)
        );
        assert_eq!(
            ChatRepository::<GroupChat>::delete(&store, tx.as_mut(), chat.chat_id()).await,
            Err(StorageError::NotFound)
        );
    }
}
