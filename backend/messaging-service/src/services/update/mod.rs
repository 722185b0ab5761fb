pub mod generic;
pub mod message;
pub mod secret;

pub use generic::GenericUpdateService;
pub use message::{GroupUpdateService, MessageUpdateService, PersonalUpdateService};
pub use secret::{SecretGroupUpdateService, SecretPersonalUpdateService, SecretUpdateService};
