use super::{validate_expiration, ChatMeta, ChatType, Chatter, PairChatter, SecretChatter};
use crate::domain::{Clock, DomainError, UserId};
use chrono::Duration;

/// Two-member end-to-end encrypted chat. Cannot be blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPersonalChat {
    pub meta: ChatMeta,
    pub members: [UserId; 2],
    pub expiration: Option<Duration>,
}

impl SecretPersonalChat {
    pub fn new(clock: &dyn Clock, members: [UserId; 2]) -> Result<Self, DomainError> {
        if members[0] == members[1] {
            return Err(DomainError::ChatWithMyself);
        }
        Ok(Self {
            meta: ChatMeta::new(clock),
            members,
            expiration: None,
        })
    }

    pub fn set_expiration(
        &mut self,
        sender: UserId,
        expiration: Option<Duration>,
    ) -> Result<(), DomainError> {
        if !self.is_member(sender) {
            return Err(DomainError::UserNotMember);
        }
        validate_expiration(expiration)?;
        self.expiration = expiration;
        Ok(())
    }
}

impl Chatter for SecretPersonalChat {
    fn meta(&self) -> &ChatMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChatMeta {
        &mut self.meta
    }

    fn chat_type(&self) -> ChatType {
        ChatType::SecretPersonal
    }

    fn members(&self) -> &[UserId] {
        &self.members
    }

    fn validate_can_send(&self, user: UserId) -> Result<(), DomainError> {
        if !self.is_member(user) {
            return Err(DomainError::UserNotMember);
        }
        Ok(())
    }
}

impl SecretChatter for SecretPersonalChat {
    fn expiration(&self) -> Option<Duration> {
        self.expiration
    }
}

impl PairChatter for SecretPersonalChat {
    fn new_pair(clock: &dyn Clock, members: [UserId; 2]) -> Result<Self, DomainError> {
        Self::new(clock, members)
    }

    fn pair(&self) -> [UserId; 2] {
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SystemClock, MAX_EXPIRATION_DAYS};

    #[test]
    fn any_member_sets_expiration() {
        let (a, b) = (UserId::new(), UserId::new());
        let mut chat = SecretPersonalChat::new(&SystemClock, [a, b]).unwrap();
        assert_eq!(chat.expiration(), None);

        chat.set_expiration(b, Some(Duration::hours(1))).unwrap();
        assert_eq!(chat.expiration(), Some(Duration::hours(1)));

        assert_eq!(
            chat.set_expiration(UserId::new(), None),
            Err(DomainError::UserNotMember)
        );
        chat.set_expiration(a, None).unwrap();
        assert_eq!(chat.expiration(), None);
    }

    #[test]
    fn out_of_range_expiration_is_rejected() {
        let (a, b) = (UserId::new(), UserId::new());
        let mut chat = SecretPersonalChat::new(&SystemClock, [a, b]).unwrap();
        chat.set_expiration(a, Some(Duration::days(1))).unwrap();

        for ttl in [
            Duration::zero(),
            Duration::seconds(-5),
            Duration::days(MAX_EXPIRATION_DAYS + 1),
            Duration::seconds(i64::MAX / 1000),
        ] {
            assert_eq!(
                chat.set_expiration(a, Some(ttl)),
                Err(DomainError::InvalidExpiration)
            );
        }
        assert_eq!(chat.expiration(), Some(Duration::days(1)));

        chat.set_expiration(b, Some(Duration::days(MAX_EXPIRATION_DAYS))).unwrap();
    }

    #[test]
    fn same_member_twice_is_rejected() {
        let a = UserId::new();
        assert_eq!(
            SecretPersonalChat::new(&SystemClock, [a, a]).unwrap_err(),
            DomainError::ChatWithMyself
        );
    }
}
