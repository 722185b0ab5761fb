use crate::config::Config;
use crate::domain::{Clock, GroupChat, PersonalChat, SecretGroupChat, SecretPersonalChat, SystemClock};
use crate::external::{FileStorage, InMemoryFileStorage};
use crate::publish::{ChannelPublisher, EventPublisher};
use crate::router::{MessagingRouter, Services};
use crate::services::{
    GenericChatService, GenericUpdateService, GroupChatService, GroupUpdateService,
    PersonalChatService, PersonalUpdateService, SecretGroupChatService, SecretGroupUpdateService,
    SecretPersonalChatService, SecretPersonalUpdateService, ServiceContext,
};
use crate::storage::{
    ChatRepository, GenericChatRepository, GenericUpdateRepository, MemoryStore,
    PairChatRepository, TransactionProvider,
};
use event_schema::FanoutMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MemoryStore,
    pub file_storage: Arc<dyn FileStorage>,
    pub publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn Clock>,
    pub router: MessagingRouter,
}

impl AppState {
    /// Wires every service against one shared store.
    pub fn new(
        config: Config,
        store: MemoryStore,
        file_storage: Arc<dyn FileStorage>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let shared = Arc::new(store.clone());
        let tx_provider: Arc<dyn TransactionProvider> = shared.clone();
        let ctx = ServiceContext::new(tx_provider.clone(), publisher.clone(), clock.clone());

        let personal_repo: Arc<dyn PairChatRepository<PersonalChat>> = shared.clone();
        let secret_personal_repo: Arc<dyn PairChatRepository<SecretPersonalChat>> = shared.clone();
        let group_repo: Arc<dyn ChatRepository<GroupChat>> = shared.clone();
        let secret_group_repo: Arc<dyn ChatRepository<SecretGroupChat>> = shared.clone();
        let generic_chats: Arc<dyn GenericChatRepository> = shared.clone();
        let generic_updates: Arc<dyn GenericUpdateRepository> = shared.clone();

        let services = Services {
            personal_chats: Arc::new(PersonalChatService::new(ctx.clone(), personal_repo)),
            secret_personal_chats: Arc::new(SecretPersonalChatService::new(
                ctx.clone(),
                secret_personal_repo,
            )),
            groups: Arc::new(GroupChatService::new(
                ctx.clone(),
                group_repo.clone(),
                file_storage.clone(),
            )),
            secret_groups: Arc::new(SecretGroupChatService::new(
                ctx.clone(),
                secret_group_repo.clone(),
                file_storage.clone(),
            )),
            personal_updates: Arc::new(PersonalUpdateService::new(
                ctx.clone(),
                shared.clone(),
                shared.clone(),
                shared.clone(),
                file_storage.clone(),
            )),
            group_updates: Arc::new(GroupUpdateService::new(
                ctx.clone(),
                group_repo,
                shared.clone(),
                shared.clone(),
                file_storage.clone(),
            )),
            secret_personal_updates: Arc::new(SecretPersonalUpdateService::new(
                ctx.clone(),
                shared.clone(),
                shared.clone(),
            )),
            secret_group_updates: Arc::new(SecretGroupUpdateService::new(
                ctx.clone(),
                secret_group_repo,
                shared.clone(),
            )),
            generic_chats: Arc::new(GenericChatService::new(
                ctx.clone(),
                generic_chats.clone(),
                generic_updates.clone(),
                config.chat_preview_count,
            )),
            generic_updates: Arc::new(GenericUpdateService::new(
                ctx,
                generic_chats.clone(),
                generic_updates,
                config.max_updates_range,
            )),
        };
        let router = MessagingRouter::new(
            services,
            generic_chats,
            tx_provider,
            config.request_timeout,
        );

        Self {
            config: Arc::new(config),
            store,
            file_storage,
            publisher,
            clock,
            router,
        }
    }

    /// In-process wiring for local runs: memory store, memory file storage,
    /// channel publisher and the system clock.
    pub fn in_memory(config: Config) -> (Self, mpsc::UnboundedReceiver<FanoutMessage>) {
        let (publisher, events) = ChannelPublisher::new(config.service_name.clone());
        let state = Self::new(
            config,
            MemoryStore::new(),
            Arc::new(InMemoryFileStorage::new()),
            Arc::new(publisher),
            Arc::new(SystemClock),
        );
        (state, events)
    }
}
