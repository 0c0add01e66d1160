// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// - Outbox relay (publishing domain events)
// - Dead letter queue
// - Health monitoring
// - Coordination and shutdown
//
// ============================================================================

mod coordinator;
mod dlq;
mod health_monitor;
mod outbox_relay;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use dlq::{AddToDlq, DlqActor, DlqStats, GetDlqMessages, GetDlqStats};
pub use health_monitor::{
    CacheProbe, GetSystemHealth, HealthMonitorActor, PublisherProbe, RunProbes, StoreProbe,
    SystemHealth, UpdateHealth,
};
pub use outbox_relay::{DrainOutbox, GetRelayStats, OutboxRelay, OutboxRelayConfig, PollOutbox, RelayStats};
