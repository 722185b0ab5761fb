use super::UpdateBase;
use crate::domain::{Clock, DomainError, SecretChatter, SecretKeyId, UserId};
use chrono::Duration;

/// Client-encrypted payload. The server never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretData {
    pub key_id: SecretKeyId,
    pub payload: Vec<u8>,
    pub initialization_vector: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretUpdate {
    pub base: UpdateBase,
    pub data: SecretData,
}

impl SecretUpdate {
    pub fn new<C: SecretChatter>(
        chat: &C,
        sender: UserId,
        data: SecretData,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        chat.validate_can_send(sender)?;
        Ok(Self {
            base: UpdateBase::new(chat.chat_id(), sender, clock),
            data,
        })
    }

    /// True once `created_at + expiration` lies in the past. Nothing is purged.
    ///
    /// A deadline beyond the representable range never expires.
    pub fn expired(&self, expiration: Duration, clock: &dyn Clock) -> bool {
        self.base
            .created_at
            .checked_add_signed(expiration)
            .is_some_and(|deadline| deadline < clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FixedClock, SecretGroupChat, SecretPersonalChat};
    use chrono::Utc;

    fn data() -> SecretData {
        SecretData {
            key_id: SecretKeyId::new(),
            payload: vec![0xde, 0xad, 0xbe, 0xef],
            initialization_vector: vec![1; 12],
        }
    }

    #[test]
    fn payload_passes_through_unchanged() {
        let clock = FixedClock::new(Utc::now());
        let (a, b) = (UserId::new(), UserId::new());
        let chat = SecretPersonalChat::new(&clock, [a, b]).unwrap();

        let update = SecretUpdate::new(&chat, a, data(), &clock).unwrap();
        assert_eq!(update.data.payload, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            SecretUpdate::new(&chat, UserId::new(), data(), &clock),
            Err(DomainError::UserNotMember)
        );
    }

    #[test]
    fn expires_relative_to_creation() {
        let clock = FixedClock::new(Utc::now());
        let admin = UserId::new();
        let chat = SecretGroupChat::new(&clock, admin, vec![admin], "Vault").unwrap();
        let update = SecretUpdate::new(&chat, admin, data(), &clock).unwrap();

        assert!(!update.expired(Duration::hours(1), &clock));
        clock.advance(Duration::hours(2));
        assert!(update.expired(Duration::hours(1), &clock));
    }

    #[test]
    fn unrepresentable_deadline_never_expires() {
        let clock = FixedClock::new(Utc::now());
        let (a, b) = (UserId::new(), UserId::new());
        let chat = SecretPersonalChat::new(&clock, [a, b]).unwrap();
        let update = SecretUpdate::new(&chat, a, data(), &clock).unwrap();

        assert!(!update.expired(Duration::seconds(i64::MAX / 1000), &clock));
    }
}
