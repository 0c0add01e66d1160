use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};

use super::publisher::{EventEnvelope, EventPublisher};
use crate::persistence::OutboxMessage;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka-compatible producer (Redpanda) guarded by a circuit breaker.
pub struct RedpandaClient {
    producer: FutureProducer,
    circuit_breaker: CircuitBreaker,
}

impl RedpandaClient {
    pub fn new(brokers: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("enable.idempotence", "true")
            .create()?;

        let cb_config = CircuitBreakerConfig {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
            success_threshold: 3,
        };

        tracing::info!(brokers = %brokers, "Redpanda producer created");

        Ok(Self {
            producer,
            circuit_breaker: CircuitBreaker::new("redpanda", cb_config),
        })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
        event_type: &str,
    ) -> Result<()> {
        let result = self
            .circuit_breaker
            .call(async {
                let headers = OwnedHeaders::new().insert(Header {
                    key: "event_type",
                    value: Some(event_type),
                });
                let record = FutureRecord::to(topic)
                    .key(key)
                    .payload(payload)
                    .headers(headers);

                self.producer
                    .send(record, rdkafka::util::Timeout::After(SEND_TIMEOUT))
                    .await
                    .map_err(|(e, _)| anyhow::anyhow!("Kafka send error: {}", e))?;

                Ok::<(), anyhow::Error>(())
            })
            .await;

        match result {
            Ok(()) => {
                tracing::debug!(topic = %topic, key = %key, "Published to Redpanda");
                Ok(())
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(topic = %topic, "Circuit breaker open - Redpanda unavailable");
                Err(anyhow::anyhow!("Circuit breaker open for Redpanda"))
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, topic = %topic, "Failed to publish to Redpanda");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl EventPublisher for RedpandaClient {
    fn name(&self) -> &'static str {
        "redpanda"
    }

    async fn publish(&self, message: &OutboxMessage) -> Result<()> {
        let envelope = serde_json::to_string(&EventEnvelope::from(message))?;
        RedpandaClient::publish(
            self,
            &message.topic,
            &message.partition_key,
            &envelope,
            &message.event_type,
        )
        .await
    }

    async fn circuit_state(&self) -> Option<CircuitState> {
        Some(self.circuit_breaker.state().await)
    }
}
