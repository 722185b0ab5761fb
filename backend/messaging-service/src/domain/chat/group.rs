use super::{normalize_members, ChatMeta, ChatType, Chatter, GroupChatter};
use crate::domain::{Clock, DomainError, Url, UserId};

pub const MAX_GROUP_NAME_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 300;

/// Membership and profile state shared by group and secret group chats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCore {
    pub admin: UserId,
    pub members: Vec<UserId>,
    pub name: String,
    pub description: String,
    pub photo: Option<Url>,
}

impl GroupCore {
    pub fn new(admin: UserId, members: Vec<UserId>, name: &str) -> Result<Self, DomainError> {
        validate_group_info(name, "")?;
        if !members.contains(&admin) {
            return Err(DomainError::AdminNotMember);
        }
        Ok(Self {
            admin,
            members: normalize_members(members),
            name: name.to_string(),
            description: String::new(),
            photo: None,
        })
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    pub fn ensure_admin(&self, sender: UserId) -> Result<(), DomainError> {
        if sender != self.admin {
            return Err(DomainError::NotAdmin);
        }
        Ok(())
    }

    pub fn update_info(
        &mut self,
        sender: UserId,
        name: &str,
        description: &str,
    ) -> Result<(), DomainError> {
        self.ensure_admin(sender)?;
        validate_group_info(name, description)?;
        self.name = name.to_string();
        self.description = description.to_string();
        Ok(())
    }

    pub fn update_photo(&mut self, sender: UserId, photo: Url) -> Result<(), DomainError> {
        self.ensure_admin(sender)?;
        self.photo = Some(photo);
        Ok(())
    }

    pub fn delete_photo(&mut self, sender: UserId) -> Result<(), DomainError> {
        self.ensure_admin(sender)?;
        if self.photo.take().is_none() {
            return Err(DomainError::GroupPhotoEmpty);
        }
        Ok(())
    }

    pub fn add_member(&mut self, sender: UserId, member: UserId) -> Result<(), DomainError> {
        self.ensure_admin(sender)?;
        if self.is_member(member) {
            return Err(DomainError::UserAlreadyMember);
        }
        self.members.push(member);
        Ok(())
    }

    pub fn delete_member(&mut self, sender: UserId, member: UserId) -> Result<(), DomainError> {
        self.ensure_admin(sender)?;
        if member == self.admin {
            return Err(DomainError::MemberIsAdmin);
        }
        let idx = self
            .members
            .iter()
            .position(|m| *m == member)
            .ok_or(DomainError::UserNotMember)?;
        self.members.remove(idx);
        Ok(())
    }

    pub(crate) fn validate_can_send(&self, user: UserId) -> Result<(), DomainError> {
        if !self.is_member(user) {
            return Err(DomainError::UserNotMember);
        }
        Ok(())
    }
}

/// Lengths are counted in characters, not bytes.
pub fn validate_group_info(name: &str, description: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::GroupNameEmpty);
    }
    if name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(DomainError::GroupNameTooLong);
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::GroupDescTooLong);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChat {
    pub meta: ChatMeta,
    pub core: GroupCore,
}

impl GroupChat {
    pub fn new(
        clock: &dyn Clock,
        admin: UserId,
        members: Vec<UserId>,
        name: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            core: GroupCore::new(admin, members, name)?,
            meta: ChatMeta::new(clock),
        })
    }
}

impl Chatter for GroupChat {
    fn meta(&self) -> &ChatMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChatMeta {
        &mut self.meta
    }

    fn chat_type(&self) -> ChatType {
        ChatType::Group
    }

    fn members(&self) -> &[UserId] {
        &self.core.members
    }

    fn validate_can_send(&self, user: UserId) -> Result<(), DomainError> {
        self.core.validate_can_send(user)
    }
}

impl GroupChatter for GroupChat {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SystemClock;

    fn team() -> (GroupChat, UserId, UserId, UserId) {
        let (admin, m1, m2) = (UserId::new(), UserId::new(), UserId::new());
        let chat = GroupChat::new(&SystemClock, admin, vec![admin, m1, m2], "Team").unwrap();
        (chat, admin, m1, m2)
    }

    #[test]
    fn constructor_validates_structure() {
        let (admin, m1) = (UserId::new(), UserId::new());
        assert_eq!(
            GroupChat::new(&SystemClock, admin, vec![m1], "Team").unwrap_err(),
            DomainError::AdminNotMember
        );
        assert_eq!(
            GroupChat::new(&SystemClock, admin, vec![admin], "").unwrap_err(),
            DomainError::GroupNameEmpty
        );
        assert_eq!(
            GroupChat::new(&SystemClock, admin, vec![admin], &"n".repeat(51)).unwrap_err(),
            DomainError::GroupNameTooLong
        );

        let chat = GroupChat::new(&SystemClock, admin, vec![admin, m1, admin, m1], "Team").unwrap();
        assert_eq!(chat.members(), &[admin, m1]);
        assert_eq!(chat.core.description, "");
        assert!(chat.core.photo.is_none());
    }

    #[test]
    fn name_length_counts_characters() {
        let admin = UserId::new();
        let name = "я".repeat(MAX_GROUP_NAME_LEN);
        assert!(GroupChat::new(&SystemClock, admin, vec![admin], &name).is_ok());
    }

    #[test]
    fn add_member_rules() {
        let (mut chat, admin, m1, _) = team();
        let m3 = UserId::new();

        assert_eq!(chat.add_member(m1, m3), Err(DomainError::NotAdmin));
        chat.add_member(admin, m3).unwrap();
        assert!(chat.is_member(m3));
        assert_eq!(chat.add_member(admin, m3), Err(DomainError::UserAlreadyMember));
    }

    #[test]
    fn delete_member_rules() {
        let (mut chat, admin, m1, m2) = team();

        assert_eq!(chat.delete_member(m1, m2), Err(DomainError::NotAdmin));
        assert_eq!(chat.delete_member(admin, admin), Err(DomainError::MemberIsAdmin));
        assert_eq!(
            chat.delete_member(admin, UserId::new()),
            Err(DomainError::UserNotMember)
        );

        chat.delete_member(admin, m1).unwrap();
        assert!(!chat.is_member(m1));
        assert!(chat.is_member(admin));
    }

    #[test]
    fn info_and_photo_are_admin_only() {
        let (mut chat, admin, m1, _) = team();

        assert_eq!(chat.update_info(m1, "x", ""), Err(DomainError::NotAdmin));
        assert_eq!(
            chat.update_info(admin, "Team", &"d".repeat(301)),
            Err(DomainError::GroupDescTooLong)
        );
        chat.update_info(admin, "Core team", "ships things").unwrap();
        assert_eq!(chat.core.name, "Core team");

        assert_eq!(chat.delete_photo(admin), Err(DomainError::GroupPhotoEmpty));
        chat.update_photo(admin, Url::new("https://cdn/p.png")).unwrap();
        assert_eq!(chat.delete_photo(m1), Err(DomainError::NotAdmin));
        chat.delete_photo(admin).unwrap();
        assert!(chat.core.photo.is_none());
    }

    #[test]
    fn only_admin_deletes_group() {
        let (chat, admin, m1, _) = team();
        assert_eq!(chat.delete(m1), Err(DomainError::NotAdmin));
        assert!(chat.delete(admin).is_ok());
    }

    #[test]
    fn non_members_cannot_send() {
        let (chat, _, m1, _) = team();
        assert!(chat.validate_can_send(m1).is_ok());
        assert_eq!(
            chat.validate_can_send(UserId::new()),
            Err(DomainError::UserNotMember)
        );
    }
}
