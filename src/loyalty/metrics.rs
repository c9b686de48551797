// Performance metrics for the loyalty system
//
// Tracks operation counts and execution times for the calculator, ledger,
// issuer and validator, with slow-operation detection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Performance threshold for slow operations (100ms)
const SLOW_OPERATION_THRESHOLD_MS: u64 = 100;

/// Performance metrics for the loyalty system
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    points_calculations: AtomicU64,
    ledger_writes: AtomicU64,
    coupon_issuances: AtomicU64,
    checkout_validations: AtomicU64,

    // Timing metrics (in microseconds)
    total_calculation_time_us: AtomicU64,
    total_ledger_time_us: AtomicU64,
    total_issuance_time_us: AtomicU64,
    total_validation_time_us: AtomicU64,

    slow_calculations: AtomicU64,
    slow_ledger_writes: AtomicU64,
    slow_issuances: AtomicU64,
    slow_validations: AtomicU64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                points_calculations: AtomicU64::new(0),
                ledger_writes: AtomicU64::new(0),
                coupon_issuances: AtomicU64::new(0),
                checkout_validations: AtomicU64::new(0),
                total_calculation_time_us: AtomicU64::new(0),
                total_ledger_time_us: AtomicU64::new(0),
                total_issuance_time_us: AtomicU64::new(0),
                total_validation_time_us: AtomicU64::new(0),
                slow_calculations: AtomicU64::new(0),
                slow_ledger_writes: AtomicU64::new(0),
                slow_issuances: AtomicU64::new(0),
                slow_validations: AtomicU64::new(0),
            }),
        }
    }

    /// Start timing a points calculation; the duration is recorded on drop
    pub fn start_calculation(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Calculation, self.clone())
    }

    /// Start timing a ledger write
    pub fn start_ledger_write(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Ledger, self.clone())
    }

    /// Start timing a coupon issuance pass
    pub fn start_issuance(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Issuance, self.clone())
    }

    /// Start timing a checkout validation
    pub fn start_validation(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Validation, self.clone())
    }

    fn record(&self, operation_type: OperationType, duration: Duration) {
        let (count, total_us, slow) = match operation_type {
            OperationType::Calculation => (
                &self.inner.points_calculations,
                &self.inner.total_calculation_time_us,
                &self.inner.slow_calculations,
            ),
            OperationType::Ledger => (
                &self.inner.ledger_writes,
                &self.inner.total_ledger_time_us,
                &self.inner.slow_ledger_writes,
            ),
            OperationType::Issuance => (
                &self.inner.coupon_issuances,
                &self.inner.total_issuance_time_us,
                &self.inner.slow_issuances,
            ),
            OperationType::Validation => (
                &self.inner.checkout_validations,
                &self.inner.total_validation_time_us,
                &self.inner.slow_validations,
            ),
        };

        count.fetch_add(1, Ordering::Relaxed);
        total_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_OPERATION_THRESHOLD_MS {
            slow.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Slow {} operation: {}ms",
                operation_type.name(),
                duration.as_millis()
            );
        }
    }

    fn avg_ms(count: u64, total_us: u64) -> f64 {
        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        let calculations = self.inner.points_calculations.load(Ordering::Relaxed);
        let ledger_writes = self.inner.ledger_writes.load(Ordering::Relaxed);
        let issuances = self.inner.coupon_issuances.load(Ordering::Relaxed);
        let validations = self.inner.checkout_validations.load(Ordering::Relaxed);

        MetricsSummary {
            points_calculations: calculations,
            avg_calculation_time_ms: Self::avg_ms(
                calculations,
                self.inner.total_calculation_time_us.load(Ordering::Relaxed),
            ),
            slow_calculations: self.inner.slow_calculations.load(Ordering::Relaxed),
            ledger_writes,
            avg_ledger_time_ms: Self::avg_ms(
                ledger_writes,
                self.inner.total_ledger_time_us.load(Ordering::Relaxed),
            ),
            slow_ledger_writes: self.inner.slow_ledger_writes.load(Ordering::Relaxed),
            coupon_issuances: issuances,
            avg_issuance_time_ms: Self::avg_ms(
                issuances,
                self.inner.total_issuance_time_us.load(Ordering::Relaxed),
            ),
            slow_issuances: self.inner.slow_issuances.load(Ordering::Relaxed),
            checkout_validations: validations,
            avg_validation_time_ms: Self::avg_ms(
                validations,
                self.inner.total_validation_time_us.load(Ordering::Relaxed),
            ),
            slow_validations: self.inner.slow_validations.load(Ordering::Relaxed),
        }
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of operation being timed
#[derive(Debug, Clone, Copy)]
enum OperationType {
    Calculation,
    Ledger,
    Issuance,
    Validation,
}

impl OperationType {
    fn name(&self) -> &'static str {
        match self {
            OperationType::Calculation => "points calculation",
            OperationType::Ledger => "ledger write",
            OperationType::Issuance => "coupon issuance",
            OperationType::Validation => "checkout validation",
        }
    }
}

/// Timer that records the operation duration when dropped
pub struct OperationTimer {
    start: Instant,
    operation_type: OperationType,
    metrics: PerformanceMetrics,
}

impl OperationTimer {
    fn new(operation_type: OperationType, metrics: PerformanceMetrics) -> Self {
        Self {
            start: Instant::now(),
            operation_type,
            metrics,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.metrics.record(self.operation_type, duration);
    }
}

/// Summary of performance metrics
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub points_calculations: u64,
    pub avg_calculation_time_ms: f64,
    pub slow_calculations: u64,
    pub ledger_writes: u64,
    pub avg_ledger_time_ms: f64,
    pub slow_ledger_writes: u64,
    pub coupon_issuances: u64,
    pub avg_issuance_time_ms: f64,
    pub slow_issuances: u64,
    pub checkout_validations: u64,
    pub avg_validation_time_ms: f64,
    pub slow_validations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_start_empty() {
        let metrics = PerformanceMetrics::new();
        let summary = metrics.summary();

        assert_eq!(summary.points_calculations, 0);
        assert_eq!(summary.avg_calculation_time_ms, 0.0);
    }

    #[test]
    fn test_operation_timer_records_on_drop() {
        let metrics = PerformanceMetrics::new();

        {
            let _timer = metrics.start_calculation();
            thread::sleep(Duration::from_millis(5));
        }

        let summary = metrics.summary();
        assert_eq!(summary.points_calculations, 1);
        assert!(summary.avg_calculation_time_ms >= 5.0);
    }

    #[test]
    fn test_slow_operation_detection() {
        let metrics = PerformanceMetrics::new();

        {
            let _timer = metrics.start_validation();
            thread::sleep(Duration::from_millis(120));
        }

        let summary = metrics.summary();
        assert_eq!(summary.slow_validations, 1);
    }

    #[test]
    fn test_operations_count_independently() {
        let metrics = PerformanceMetrics::new();

        drop(metrics.start_ledger_write());
        drop(metrics.start_ledger_write());
        drop(metrics.start_issuance());

        let summary = metrics.summary();
        assert_eq!(summary.ledger_writes, 2);
        assert_eq!(summary.coupon_issuances, 1);
        assert_eq!(summary.checkout_validations, 0);
    }
}
