use thiserror::Error;

/// Rule violations raised by the pure domain layer.
///
/// These are surfaced unchanged through the service layer and are never
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    // Authorization
    #[error("user is not member of a chat")]
    UserNotMember,
    #[error("sender is not chat admin")]
    NotAdmin,
    #[error("user is not update's sender")]
    UserNotSender,
    #[error("the reaction is not from this user")]
    ReactionNotFromUser,
    #[error("chat is blocked")]
    ChatBlocked,

    // Content validation
    #[error("the text is empty")]
    TextEmpty,
    #[error("too many runes in text")]
    TooManyTextRunes,
    #[error("file is too big")]
    FileTooBig,
    #[error("group name is empty")]
    GroupNameEmpty,
    #[error("group name is too long")]
    GroupNameTooLong,
    #[error("group description is too long")]
    GroupDescTooLong,
    #[error("invalid reaction type")]
    InvalidReactionType,
    #[error("expiration is out of range")]
    InvalidExpiration,

    // State
    #[error("update is deleted")]
    UpdateDeleted,
    #[error("update is not from this chat")]
    UpdateNotFromChat,
    #[error("user is already a member of a chat")]
    UserAlreadyMember,
    #[error("group member is admin")]
    MemberIsAdmin,
    #[error("chat is already blocked")]
    AlreadyBlocked,
    #[error("chat is already unblocked")]
    AlreadyUnblocked,
    #[error("chat with myself")]
    ChatWithMyself,
    #[error("group members don't include admin")]
    AdminNotMember,
    #[error("group photo is empty")]
    GroupPhotoEmpty,
}

impl DomainError {
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotMember
                | DomainError::NotAdmin
                | DomainError::UserNotSender
                | DomainError::ReactionNotFromUser
                | DomainError::ChatBlocked
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::TextEmpty
                | DomainError::TooManyTextRunes
                | DomainError::FileTooBig
                | DomainError::GroupNameEmpty
                | DomainError::GroupNameTooLong
                | DomainError::GroupDescTooLong
                | DomainError::InvalidReactionType
                | DomainError::InvalidExpiration
        )
    }
}
