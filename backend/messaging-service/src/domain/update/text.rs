use super::{validate_reference, Message, UpdateBase, Updater};
use crate::domain::{Chatter, Clock, DomainError, UpdateId, UserId};

pub const MAX_TEXT_RUNES: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub base: UpdateBase,
    pub reply_to: Option<UpdateId>,
    pub forwarded: bool,
    pub text: String,
    /// Latest edit, if any.
    pub edited: Option<TextMessageEdited>,
}

/// Edit record, itself an update in the chat log, pointing back at the
/// edited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessageEdited {
    pub base: UpdateBase,
    pub message_id: UpdateId,
    pub new_text: String,
}

impl TextMessage {
    pub fn new(
        chat: &dyn Chatter,
        sender: UserId,
        text: &str,
        reply_to: Option<&Message>,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        chat.validate_can_send(sender)?;
        validate_text(text)?;
        if let Some(reply) = reply_to {
            validate_reference(chat, sender, reply.base())?;
        }

        Ok(Self {
            base: UpdateBase::new(chat.chat_id(), sender, clock),
            reply_to: reply_to.map(|m| m.base().id),
            forwarded: false,
            text: text.to_string(),
            edited: None,
        })
    }

    /// Replaces the text and returns the edit record to persist.
    pub fn edit(
        &mut self,
        chat: &dyn Chatter,
        sender: UserId,
        new_text: &str,
        clock: &dyn Clock,
    ) -> Result<TextMessageEdited, DomainError> {
        chat.validate_can_send(sender)?;
        self.base.ensure_from_chat(chat)?;
        if self.base.sender_id != sender {
            return Err(DomainError::UserNotSender);
        }
        if self.base.deleted_for(sender) {
            return Err(DomainError::UpdateDeleted);
        }
        validate_text(new_text)?;

        let edited = TextMessageEdited {
            base: UpdateBase::new(chat.chat_id(), sender, clock),
            message_id: self.base.id,
            new_text: new_text.to_string(),
        };
        self.text = new_text.to_string();
        self.edited = Some(edited.clone());
        Ok(edited)
    }

    /// Copies the text into `dest` as a fresh, unreplied message.
    ///
    /// Blocking of the source chat is ignored; only membership matters there.
    pub fn forward(
        &self,
        source: &dyn Chatter,
        dest: &dyn Chatter,
        sender: UserId,
        clock: &dyn Clock,
    ) -> Result<TextMessage, DomainError> {
        if !source.is_member(sender) {
            return Err(DomainError::UserNotMember);
        }
        dest.validate_can_send(sender)?;

        Ok(TextMessage {
            base: UpdateBase::new(dest.chat_id(), sender, clock),
            reply_to: None,
            forwarded: true,
            text: self.text.clone(),
            edited: None,
        })
    }
}

fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.is_empty() {
        return Err(DomainError::TextEmpty);
    }
    if text.chars().count() > MAX_TEXT_RUNES {
        return Err(DomainError::TooManyTextRunes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{group, pair};
    use super::super::DeleteMode;
    use super::*;
    use crate::domain::{FixedClock, SystemClock};
    use chrono::{Duration, Utc};

    fn stored(chat: &dyn Chatter, sender: UserId, text: &str, id: u64) -> TextMessage {
        let mut msg = TextMessage::new(chat, sender, text, None, &SystemClock).unwrap();
        msg.base.id = UpdateId::new(id);
        msg
    }

    #[test]
    fn text_length_bounds() {
        let p = pair();
        assert_eq!(
            TextMessage::new(&p.chat, p.a, "", None, &SystemClock),
            Err(DomainError::TextEmpty)
        );
        assert_eq!(
            TextMessage::new(&p.chat, p.a, &"x".repeat(2001), None, &SystemClock),
            Err(DomainError::TooManyTextRunes)
        );
        assert!(TextMessage::new(&p.chat, p.a, &"ж".repeat(2000), None, &SystemClock).is_ok());
    }

    #[test]
    fn send_checks_membership_before_content() {
        let p = pair();
        assert_eq!(
            TextMessage::new(&p.chat, UserId::new(), "", None, &SystemClock),
            Err(DomainError::UserNotMember)
        );
    }

    #[test]
    fn new_message_is_unassigned_and_stamped() {
        let p = pair();
        let now = Utc::now();
        let clock = FixedClock::new(now);
        let msg = TextMessage::new(&p.chat, p.a, "hi", None, &clock).unwrap();

        assert!(!msg.base.id.is_assigned());
        assert_eq!(msg.base.created_at, now);
        assert_eq!(msg.base.chat_id, p.chat.chat_id());
        assert!(!msg.forwarded);
    }

    #[test]
    fn reply_must_be_visible_and_from_same_chat() {
        let p = pair();
        let other = pair();
        let foreign = Message::Text(stored(&other.chat, other.a, "elsewhere", 1));
        assert_eq!(
            TextMessage::new(&p.chat, p.a, "re", Some(&foreign), &SystemClock),
            Err(DomainError::UpdateNotFromChat)
        );

        let mut target = stored(&p.chat, p.b, "original", 1);
        let deletion = target
            .base
            .delete(&p.chat, p.a, DeleteMode::ForSender, &SystemClock)
            .unwrap();
        target.base.add_deletion(deletion);
        let target = Message::Text(target);

        assert_eq!(
            TextMessage::new(&p.chat, p.a, "re", Some(&target), &SystemClock),
            Err(DomainError::UpdateDeleted)
        );
        let reply = TextMessage::new(&p.chat, p.b, "re", Some(&target), &SystemClock).unwrap();
        assert_eq!(reply.reply_to, Some(UpdateId::new(1)));
    }

    #[test]
    fn edit_replaces_text_and_links_record() {
        let p = pair();
        let mut msg = stored(&p.chat, p.a, "hi", 4);

        msg.edit(&p.chat, p.a, "hello", &SystemClock).unwrap();
        let edited = msg.edit(&p.chat, p.a, "hello there", &SystemClock).unwrap();

        assert_eq!(msg.text, "hello there");
        assert_eq!(edited.message_id, UpdateId::new(4));
        assert_eq!(edited.new_text, "hello there");
        assert_eq!(msg.edited.as_ref().map(|e| e.message_id), Some(UpdateId::new(4)));
    }

    #[test]
    fn edit_rules() {
        let p = pair();
        let mut msg = stored(&p.chat, p.a, "hi", 1);

        assert_eq!(
            msg.edit(&p.chat, p.b, "mine now", &SystemClock),
            Err(DomainError::UserNotSender)
        );
        assert_eq!(msg.edit(&p.chat, p.a, "", &SystemClock), Err(DomainError::TextEmpty));

        let other = pair();
        assert_eq!(
            msg.edit(&other.chat, other.a, "x", &SystemClock),
            Err(DomainError::UpdateNotFromChat)
        );

        let deletion = msg
            .base
            .delete(&p.chat, p.a, DeleteMode::ForSender, &SystemClock)
            .unwrap();
        msg.base.add_deletion(deletion);
        assert_eq!(
            msg.edit(&p.chat, p.a, "too late", &SystemClock),
            Err(DomainError::UpdateDeleted)
        );
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn forward_copies_content_only() {
        let clock = FixedClock::new(Utc::now());
        let source = pair();
        let mut msg = stored(&source.chat, source.a, "look", 9);
        msg.reply_to = Some(UpdateId::new(3));
        msg.edit(&source.chat, source.a, "look at this", &clock).unwrap();
        let deletion = msg
            .base
            .delete(&source.chat, source.b, DeleteMode::ForSender, &clock)
            .unwrap();
        msg.base.add_deletion(deletion);

        let dest = group(&clock, source.a, &[UserId::new()]);
        clock.advance(Duration::seconds(5));
        let forwarded = msg.forward(&source.chat, &dest, source.a, &clock).unwrap();

        assert_eq!(forwarded.base.chat_id, dest.chat_id());
        assert!(forwarded.forwarded);
        assert_eq!(forwarded.reply_to, None);
        assert_eq!(forwarded.text, "look at this");
        assert!(forwarded.edited.is_none());
        assert!(forwarded.base.deletions.is_empty());
        assert!(!forwarded.base.id.is_assigned());
        assert_eq!(forwarded.base.created_at, clock.now());
    }

    #[test]
    fn forward_ignores_source_block_but_not_destination() {
        let source = pair();
        let msg = stored(&source.chat, source.a, "look", 1);
        let mut blocked_source = source.chat.clone();
        blocked_source.block_by(source.b).unwrap();

        let dest = group(&SystemClock, source.a, &[]);
        assert!(msg.forward(&blocked_source, &dest, source.a, &SystemClock).is_ok());

        assert_eq!(
            msg.forward(&blocked_source, &blocked_source, source.a, &SystemClock),
            Err(DomainError::ChatBlocked)
        );
        assert_eq!(
            msg.forward(&source.chat, &dest, UserId::new(), &SystemClock),
            Err(DomainError::UserNotMember)
        );
    }
}
