//! Composite readiness over every external dependency.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use cas_queue::NotificationConsumer;

/// A single dependency's readiness probe plus the operator metadata
/// shown on the health endpoint.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    /// 1 = critical, 2 = degraded, 3 = cosmetic.
    fn severity(&self) -> u8 {
        2
    }
    fn business_impact(&self) -> &str;
    fn panic_guide(&self) -> &str;
    async fn check(&self) -> std::result::Result<(), String>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: String,
    pub panic_guide: String,
    pub check_output: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub healthy: bool,
    pub checks: Vec<CheckResult>,
}

/// Runs every child check; aggregate readiness is the conjunction.
pub struct HealthAggregator {
    checks: Vec<Arc<dyn ReadinessCheck>>,
}

impl HealthAggregator {
    pub fn new(checks: Vec<Arc<dyn ReadinessCheck>>) -> Self {
        Self { checks }
    }

    pub async fn report(&self) -> HealthReport {
        let results = futures::future::join_all(self.checks.iter().map(|check| async move {
            let outcome = check.check().await;
            CheckResult {
                id: check.id().to_string(),
                name: check.name().to_string(),
                ok: outcome.is_ok(),
                severity: check.severity(),
                business_impact: check.business_impact().to_string(),
                panic_guide: check.panic_guide().to_string(),
                check_output: outcome.err().unwrap_or_else(|| "OK".to_string()),
            }
        }))
        .await;

        HealthReport {
            healthy: results.iter().all(|r| r.ok),
            checks: results,
        }
    }

    pub async fn healthy(&self) -> bool {
        self.report().await.healthy
    }
}

/// Adapter exposing the notification queue consumer as a readiness check.
pub struct NotificationQueueCheck {
    consumer: Arc<dyn NotificationConsumer>,
}

impl NotificationQueueCheck {
    pub fn new(consumer: Arc<dyn NotificationConsumer>) -> Self {
        Self { consumer }
    }
}

#[async_trait]
impl ReadinessCheck for NotificationQueueCheck {
    fn id(&self) -> &str {
        "notification-queue"
    }

    fn name(&self) -> &str {
        "Notification queue reachable"
    }

    fn severity(&self) -> u8 {
        1
    }

    fn business_impact(&self) -> &str {
        "Concept update notifications are not consumed; aggregation stalls"
    }

    fn panic_guide(&self) -> &str {
        "Check SQS queue permissions and AWS connectivity from this service"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        self.consumer.gtg().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticCheck {
        id: &'static str,
        ok: bool,
    }

    #[async_trait]
    impl ReadinessCheck for StaticCheck {
        fn id(&self) -> &str {
            self.id
        }
        fn name(&self) -> &str {
            self.id
        }
        fn business_impact(&self) -> &str {
            "none"
        }
        fn panic_guide(&self) -> &str {
            "none"
        }
        async fn check(&self) -> std::result::Result<(), String> {
            if self.ok {
                Ok(())
            } else {
                Err("down".to_string())
            }
        }
    }

    #[tokio::test]
    async fn readiness_is_the_conjunction_of_children() {
        let aggregator = HealthAggregator::new(vec![
            Arc::new(StaticCheck { id: "a", ok: true }),
            Arc::new(StaticCheck { id: "b", ok: true }),
        ]);
        assert!(aggregator.healthy().await);

        let aggregator = HealthAggregator::new(vec![
            Arc::new(StaticCheck { id: "a", ok: true }),
            Arc::new(StaticCheck { id: "b", ok: false }),
        ]);
        let report = aggregator.report().await;
        assert!(!report.healthy);
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.checks[1].check_output, "down");
    }
}
