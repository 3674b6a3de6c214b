//! Data access for users and sessions

pub mod session;
pub mod user;

pub use session::{DEFAULT_SESSION_TTL_DAYS, PgSessionStore, SessionStore, default_session_ttl};
pub use user::{CreateUserError, PgUserStore, UserStore};
