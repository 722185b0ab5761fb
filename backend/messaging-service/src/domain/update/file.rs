use super::{validate_reference, Message, UpdateBase, Updater};
use crate::domain::{Chatter, Clock, DomainError, FileId, Timestamp, UpdateId, Url, UserId};

/// 1 GiB
pub const MAX_FILE_SIZE: u64 = 1 << 30;

/// File description as reported by the file storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub file_id: FileId,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub file_url: Url,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMessage {
    pub base: UpdateBase,
    pub reply_to: Option<UpdateId>,
    pub forwarded: bool,
    pub file: FileMeta,
}

impl FileMessage {
    pub fn new(
        chat: &dyn Chatter,
        sender: UserId,
        file: FileMeta,
        reply_to: Option<&Message>,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        chat.validate_can_send(sender)?;
        if file.file_size > MAX_FILE_SIZE {
            return Err(DomainError::FileTooBig);
        }
        if let Some(reply) = reply_to {
            validate_reference(chat, sender, reply.base())?;
        }

        Ok(Self {
            base: UpdateBase::new(chat.chat_id(), sender, clock),
            reply_to: reply_to.map(|m| m.base().id),
            forwarded: false,
            file,
        })
    }

    pub fn forward(
        &self,
        source: &dyn Chatter,
        dest: &dyn Chatter,
        sender: UserId,
        clock: &dyn Clock,
    ) -> Result<FileMessage, DomainError> {
        if !source.is_member(sender) {
            return Err(DomainError::UserNotMember);
        }
        dest.validate_can_send(sender)?;

        Ok(FileMessage {
            base: UpdateBase::new(dest.chat_id(), sender, clock),
            reply_to: None,
            forwarded: true,
            file: self.file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{group, pair};
    use super::*;
    use crate::domain::SystemClock;
    use chrono::Utc;

    fn meta(size: u64) -> FileMeta {
        FileMeta {
            file_id: FileId::new(),
            file_name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            file_size: size,
            file_url: Url::new("https://files/report.pdf"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn file_size_limit() {
        let p = pair();
        assert_eq!(
            FileMessage::new(&p.chat, p.a, meta(MAX_FILE_SIZE + 1), None, &SystemClock),
            Err(DomainError::FileTooBig)
        );
        let msg = FileMessage::new(&p.chat, p.a, meta(MAX_FILE_SIZE), None, &SystemClock).unwrap();
        assert_eq!(msg.file.file_size, MAX_FILE_SIZE);
    }

    #[test]
    fn blocked_chat_rejects_files() {
        let mut p = pair();
        p.chat.block_by(p.a).unwrap();
        assert_eq!(
            FileMessage::new(&p.chat, p.b, meta(10), None, &SystemClock),
            Err(DomainError::ChatBlocked)
        );
    }

    #[test]
    fn forward_keeps_file() {
        let p = pair();
        let mut msg = FileMessage::new(&p.chat, p.a, meta(10), None, &SystemClock).unwrap();
        msg.base.id = UpdateId::new(2);

        let dest = group(&SystemClock, p.b, &[p.a]);
        let forwarded = msg.forward(&p.chat, &dest, p.b, &SystemClock).unwrap();
        assert!(forwarded.forwarded);
        assert_eq!(forwarded.file, msg.file);
        assert_eq!(forwarded.base.sender_id, p.b);
        assert_eq!(forwarded.base.chat_id, dest.chat_id());
    }
}
