pub mod generic;
pub mod group;
pub mod pair;

pub use generic::{ChatLoadOptions, GenericChatService};
pub use group::{GroupChatService, GroupService, SecretGroupChatService};
pub use pair::{PairChatService, PersonalChatService, SecretPersonalChatService};
