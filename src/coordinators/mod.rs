// Coordinators layer - Workflow orchestration
//
// Coordinators compose stores and providers into the operations the API
// layer exposes. They own the ordering of steps and the policy decisions.

pub mod access_guard;
pub mod admin_coordinator;
pub mod auth_coordinator;

pub use access_guard::AccessGuard;
pub use admin_coordinator::AdminCoordinator;
pub use auth_coordinator::AuthCoordinator;
