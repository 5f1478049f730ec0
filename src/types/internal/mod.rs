pub mod auth;
pub mod context;
pub mod login;
pub mod role;

pub use auth::{Claims, TokenPair};
pub use context::{IdentityContext, RequestContext, UserSummary};
pub use login::{FailReason, LoginLogFilter, SessionGrant};
pub use role::Role;
