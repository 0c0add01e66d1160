use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Health Check Abstractions
// ============================================================================
//
// Components report a `HealthStatus`; the health monitor aggregates them.
// Probes are polled periodically, other actors push updates directly.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, HealthStatus::Degraded(_))
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }

    /// Gauge encoding: 0=Unhealthy, 1=Degraded, 2=Healthy.
    pub fn as_gauge(&self) -> i64 {
        match self {
            HealthStatus::Unhealthy(_) => 0,
            HealthStatus::Degraded(_) => 1,
            HealthStatus::Healthy => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    pub details: Option<String>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A dependency the health monitor polls (store, cache, broker).
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn component(&self) -> &'static str;

    async fn check(&self) -> HealthStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let healthy = serde_json::to_value(HealthStatus::Healthy).unwrap();
        assert_eq!(healthy, serde_json::json!({"status": "healthy"}));

        let degraded = serde_json::to_value(HealthStatus::Degraded("slow".into())).unwrap();
        assert_eq!(degraded, serde_json::json!({"status": "degraded", "reason": "slow"}));
    }

    #[test]
    fn test_gauge_encoding() {
        assert_eq!(HealthStatus::Healthy.as_gauge(), 2);
        assert_eq!(HealthStatus::Degraded(String::new()).as_gauge(), 1);
        assert_eq!(HealthStatus::Unhealthy(String::new()).as_gauge(), 0);
        assert!(HealthStatus::Unhealthy(String::new()).is_unhealthy());
    }
}
