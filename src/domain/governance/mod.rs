// ============================================================================
// Governance Domain - policies, acceptances and the audit trail
// ============================================================================
//
// Policies are versioned per type; publishing a new version supersedes the
// active one in the same unit of work. Acceptances pin the exact version a
// user agreed to.
//
// ============================================================================

pub mod commands;
pub mod dto;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod model;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use events::*;
pub use handlers::{register, GovernanceHandlers};
pub use model::*;
pub use queries::*;
