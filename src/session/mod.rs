//! Authenticated-session lifecycle.
//!
//! [`SessionManager`] restores a persisted session at startup, re-validates
//! Sign in with Apple credentials when the app returns to the foreground,
//! and keeps the host's query cache in step with every identity change.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bodhira_auth::{SessionConfig, SessionManager};
//!
//! // 1. Implement KeyValueStore, AccessRevoker, CredentialStateProvider
//! //    and QueryCache for the host platform
//! // 2. Build the manager at the composition root
//! let manager = Arc::new(SessionManager::new(
//!     SessionConfig::from_env()?, store, revoker, credentials, cache,
//! ));
//!
//! // 3. Restore once at startup, then forward lifecycle events
//! manager.restore().await;
//! let _subscription = manager.spawn_lifecycle_listener(app_state_rx);
//!
//! // 4. Observe
//! let mut changes = manager.subscribe();
//! ```

mod manager;
mod state;


pub use manager::{CredentialCheck, SessionManager};
pub use state::{Session, SessionPhase};
