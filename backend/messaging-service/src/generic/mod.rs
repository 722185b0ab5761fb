//! Read-side projection of chats and updates for listing and history APIs.
//!
//! Never used to authorize writes.

pub mod chat;
pub mod update;

pub use chat::{ChatInfo, GenericChat};
pub use update::{GenericUpdate, UpdateContent};
