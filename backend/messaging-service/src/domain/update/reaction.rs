use super::{validate_reference, Deletion, DeleteMode, Message, UpdateBase, Updater};
use crate::domain::{Chatter, Clock, DomainError, UpdateId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widening this list is a product decision.
pub const ALLOWED_REACTION_TYPES: [&str; 6] = ["heart", "like", "thunder", "cry", "dislike", "bzZZ"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionType(String);

impl ReactionType {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if ALLOWED_REACTION_TYPES.contains(&value) {
            Ok(Self(value.to_string()))
        } else {
            Err(DomainError::InvalidReactionType)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub base: UpdateBase,
    pub reaction_type: ReactionType,
    pub message_id: UpdateId,
}

impl Reaction {
    pub fn new(
        chat: &dyn Chatter,
        sender: UserId,
        target: &Message,
        reaction_type: &str,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        chat.validate_can_send(sender)?;
        validate_reference(chat, sender, target.base())?;
        let reaction_type = ReactionType::parse(reaction_type)?;

        Ok(Self {
            base: UpdateBase::new(chat.chat_id(), sender, clock),
            reaction_type,
            message_id: target.base().id,
        })
    }

    /// Only the reacting user may take a reaction back; it disappears for everyone.
    pub fn delete(
        &self,
        chat: &dyn Chatter,
        sender: UserId,
        clock: &dyn Clock,
    ) -> Result<Deletion, DomainError> {
        chat.validate_can_send(sender)?;
        self.base.ensure_from_chat(chat)?;
        if self.base.sender_id != sender {
            return Err(DomainError::ReactionNotFromUser);
        }
        self.base.delete(chat, sender, DeleteMode::ForAll, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::pair;
    use super::super::TextMessage;
    use super::*;
    use crate::domain::SystemClock;

    fn target(chat: &dyn Chatter, sender: UserId) -> Message {
        let mut msg = TextMessage::new(chat, sender, "hi", None, &SystemClock).unwrap();
        msg.base.id = UpdateId::new(1);
        Message::Text(msg)
    }

    #[test]
    fn reaction_type_whitelist() {
        for t in ALLOWED_REACTION_TYPES {
            assert!(ReactionType::parse(t).is_ok());
        }
        assert_eq!(ReactionType::parse("bzzz"), Err(DomainError::InvalidReactionType));
        assert_eq!(ReactionType::parse(""), Err(DomainError::InvalidReactionType));
    }

    #[test]
    fn reaction_targets_visible_message_in_same_chat() {
        let p = pair();
        let msg = target(&p.chat, p.a);

        let reaction = Reaction::new(&p.chat, p.b, &msg, "heart", &SystemClock).unwrap();
        assert_eq!(reaction.message_id, UpdateId::new(1));
        assert_eq!(reaction.reaction_type.as_str(), "heart");

        let other = pair();
        assert_eq!(
            Reaction::new(&other.chat, other.a, &msg, "like", &SystemClock),
            Err(DomainError::UpdateNotFromChat)
        );
        assert_eq!(
            Reaction::new(&p.chat, p.b, &msg, "wow", &SystemClock),
            Err(DomainError::InvalidReactionType)
        );
    }

    #[test]
    fn only_reactor_deletes_reaction_for_all() {
        let p = pair();
        let msg = target(&p.chat, p.a);
        let mut reaction = Reaction::new(&p.chat, p.b, &msg, "cry", &SystemClock).unwrap();
        reaction.base.id = UpdateId::new(2);

        assert_eq!(
            reaction.delete(&p.chat, p.a, &SystemClock),
            Err(DomainError::ReactionNotFromUser)
        );
        let deletion = reaction.delete(&p.chat, p.b, &SystemClock).unwrap();
        assert_eq!(deletion.mode, DeleteMode::ForAll);
        assert_eq!(deletion.deleted_id, UpdateId::new(2));

        reaction.base.add_deletion(deletion);
        assert!(reaction.deleted_for(p.a));
        assert_eq!(
            reaction.delete(&p.chat, p.b, &SystemClock),
            Err(DomainError::UpdateDeleted)
        );
    }
}
