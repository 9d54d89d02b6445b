pub mod guard;
pub mod repo;
pub mod repo_types;

pub use guard::{tenant_guard, AuthContext, CurrentTenant};
pub use repo_types::{OrgSummary, Organization};
