//! Credential models, the shared credential store, and the current-workspace session.

pub mod credential;
pub mod secret;
pub mod workspace;

pub use credential::*;
pub use secret::*;
pub use workspace::*;
