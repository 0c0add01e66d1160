// ============================================================================
// Messaging - where the outbox relay sends domain events
// ============================================================================

mod publisher;
mod redpanda;

pub use publisher::{EventEnvelope, EventPublisher, LoggingPublisher, RecordingPublisher};
pub use redpanda::RedpandaClient;
