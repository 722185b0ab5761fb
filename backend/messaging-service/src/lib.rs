//! Chat and update domain of the messaging backend, with the orchestration
//! services and chat-type router built on top of it.

pub mod config;
pub mod domain;
pub mod error;
pub mod external;
pub mod generic;
pub mod logging;
pub mod publish;
pub mod request;
pub mod router;
pub mod services;
pub mod state;
pub mod storage;

pub use error::{ServiceError, ServiceResult};
pub use router::MessagingRouter;
pub use state::AppState;
