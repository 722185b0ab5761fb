use super::{
    validate_expiration, ChatMeta, ChatType, Chatter, GroupChatter, GroupCore, SecretChatter,
};
use crate::domain::{Clock, DomainError, UserId};
use chrono::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretGroupChat {
    pub meta: ChatMeta,
    pub core: GroupCore,
    pub expiration: Option<Duration>,
}

impl SecretGroupChat {
    pub fn new(
        clock: &dyn Clock,
        admin: UserId,
        members: Vec<UserId>,
        name: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            core: GroupCore::new(admin, members, name)?,
            meta: ChatMeta::new(clock),
            expiration: None,
        })
    }

    pub fn set_expiration(
        &mut self,
        sender: UserId,
        expiration: Option<Duration>,
    ) -> Result<(), DomainError> {
        self.core.ensure_admin(sender)?;
        validate_expiration(expiration)?;
        self.expiration = expiration;
        Ok(())
    }
}

impl Chatter for SecretGroupChat {
    fn meta(&self) -> &ChatMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChatMeta {
        &mut self.meta
    }

    fn chat_type(&self) -> ChatType {
        ChatType::SecretGroup
    }

    fn members(&self) -> &[UserId] {
        &self.core.members
    }

    fn validate_can_send(&self, user: UserId) -> Result<(), DomainError> {
        self.core.validate_can_send(user)
    }
}

impl SecretChatter for SecretGroupChat {
    fn expiration(&self) -> Option<Duration> {
        self.expiration
    }
}

impl GroupChatter for SecretGroupChat {
    fn new_group(
        clock: &dyn Clock,
        admin: UserId,
        members: Vec<UserId>,
        name: &str,
    ) -> Result<Self, DomainError> {
        Self::new(clock, admin, members, name)
    }

    fn core(&self) -> &GroupCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GroupCore {
        &mut self.core
    }
}
