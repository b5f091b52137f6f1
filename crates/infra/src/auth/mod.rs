//! Session authentication
//!
//! Two pieces: the [`SessionStore`], a shared slot holding the credentials
//! from the most recent completed login cycle, and the
//! [`CredentialManager`], the only writer of that slot. The manager performs
//! the two-step login sequence (OAuth client-credentials grant, then service
//! login) and publishes the result as one atomic snapshot.

pub mod credentials;
pub mod session;

pub use credentials::{AuthError, CredentialManager};
pub use session::SessionStore;
