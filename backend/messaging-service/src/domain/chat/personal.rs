use super::{ChatMeta, ChatType, Chatter, PairChatter};
use crate::domain::{Clock, DomainError, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalChat {
    pub meta: ChatMeta,
    pub members: [UserId; 2],
    pub blocked_by: Vec<UserId>,
}

impl PersonalChat {
    pub fn new(clock: &dyn Clock, members: [UserId; 2]) -> Result<Self, DomainError> {
        if members[0] == members[1] {
            return Err(DomainError::ChatWithMyself);
        }
        Ok(Self {
            meta: ChatMeta::new(clock),
            members,
            blocked_by: Vec::new(),
        })
    }

    /// Blocking is chat-wide: once any member blocks, nobody can send.
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    pub fn block_by(&mut self, user: UserId) -> Result<(), DomainError> {
        if !self.is_member(user) {
            return Err(DomainError::UserNotMember);
        }
        if self.blocked_by.contains(&user) {
            return Err(DomainError::AlreadyBlocked);
        }
        self.blocked_by.push(user);
        Ok(())
    }

    pub fn unblock_by(&mut self, user: UserId) -> Result<(), DomainError> {
        if !self.is_member(user) {
            return Err(DomainError::UserNotMember);
        }
        if !self.blocked_by.contains(&user) {
            return Err(DomainError::AlreadyUnblocked);
        }
        self.blocked_by.retain(|member| *member != user);
        Ok(())
    }
}

impl Chatter for PersonalChat {
    fn meta(&self) -> &ChatMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChatMeta {
        &mut self.meta
    }

    fn chat_type(&self) -> ChatType {
        ChatType::Personal
    }

    fn members(&self) -> &[UserId] {
        &self.members
    }

    fn validate_can_send(&self, user: UserId) -> Result<(), DomainError> {
        if !self.is_member(user) {
            return Err(DomainError::UserNotMember);
        }
        if self.is_blocked() {
            return Err(DomainError::ChatBlocked);
        }
        Ok(())
    }
}

impl PairChatter for PersonalChat {
    fn new_pair(clock: &dyn Clock, members: [UserId; 2]) -> Result<Self, DomainError> {
        Self::new(clock, members)
    }

    fn pair(&self) -> [UserId; 2] {
        self.members
    }
}
