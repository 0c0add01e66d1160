// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for asynchronous, long-running work.
//
// Structure:
// - core/           - Health abstractions shared by the actors
// - infrastructure/ - Outbox relay, DLQ, health monitor, coordinator
//
// Note: Use cases run through the mediator, NOT actors. Actors are reserved
//       for infrastructure concerns only.
//
// ============================================================================

mod core;
mod infrastructure;

pub use self::core::{ComponentHealth, HealthProbe, HealthStatus};
pub use infrastructure::{
    AddToDlq, CacheProbe, Coordinator, CoordinatorConfig, DlqActor, DlqStats, DrainOutbox,
    GetDlqMessages, GetDlqStats, GetRelayStats, GetSystemHealth, HealthMonitorActor, OutboxRelay,
    OutboxRelayConfig, PollOutbox, PublisherProbe, RelayStats, RunProbes, StoreProbe, SystemHealth,
    UpdateHealth,
};
