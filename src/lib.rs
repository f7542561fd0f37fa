#![doc = include_str!("../README.md")]

pub mod cache;
#[cfg(feature = "chat")]
pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use cache::{NoopCache, QueryCache};
#[cfg(feature = "chat")]
pub use chat::{Citation, Message, MessageStore, Sender};
pub use config::{SessionConfig, StorageKeys};
pub use error::{BoxError, Error};
pub use identity::{AccessRevoker, AlwaysAuthorized, CredentialStateProvider, NoopRevoker};
pub use lifecycle::{AppState, LifecycleSubscription};
pub use session::{CredentialCheck, Session, SessionManager, SessionPhase};
pub use storage::{KeyValueStore, MemoryStore};
pub use token::{decode_expiry, is_fresh};
pub use types::{AppleUserId, AuthProvider, CredentialState, UserId};
