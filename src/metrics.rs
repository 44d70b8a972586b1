//! Prometheus reconciliation metrics, grounded in the teacher's
//! `Metrics`/`ReconcileMeasurer` shape (`controller.rs`), generalized from a
//! single CoreDB controller to the per-kind reconcile counters this operator
//! needs: one family of `runs`/`failures`/`duration` series labeled by the
//! child resource kind, plus the site-level phase gauges the orchestrator
//! updates on every tick.

use crate::{apis::site_types::StagingSite, Error};
use kube::ResourceExt;
use prometheus::{
    histogram_opts, opts, HistogramVec, IntCounterVec, IntGaugeVec, Registry,
};
use tokio::time::Instant;

#[derive(Clone)]
pub struct Metrics {
    pub runs: IntCounterVec,
    pub failures: IntCounterVec,
    pub duration: HistogramVec,
    pub sites_by_state: IntGaugeVec,
}

impl Default for Metrics {
    fn default() -> Self {
        let runs = IntCounterVec::new(
            opts!("kube_stager_reconcile_runs_total", "reconciliations started, by controller"),
            &["controller"],
        )
        .unwrap();
        let failures = IntCounterVec::new(
            opts!("kube_stager_reconcile_failures_total", "reconciliations that returned an error, by controller and error kind"),
            &["controller", "error"],
        )
        .unwrap();
        let duration = HistogramVec::new(
            histogram_opts!(
                "kube_stager_reconcile_duration_seconds",
                "reconcile wall time, by controller",
                vec![0.01, 0.1, 0.25, 0.5, 1., 5., 15., 60.]
            ),
            &["controller"],
        )
        .unwrap();
        let sites_by_state = IntGaugeVec::new(
            opts!("kube_stager_sites_by_state", "number of StagingSites currently in each status.state"),
            &["state"],
        )
        .unwrap();
        Self { runs, failures, duration, sites_by_state }
    }
}

impl Metrics {
    pub fn register(self, registry: &Registry) -> Result<Self, prometheus::Error> {
        registry.register(Box::new(self.runs.clone()))?;
        registry.register(Box::new(self.failures.clone()))?;
        registry.register(Box::new(self.duration.clone()))?;
        registry.register(Box::new(self.sites_by_state.clone()))?;
        Ok(self)
    }

    pub fn reconcile_failure(&self, site: &StagingSite, error: &Error) {
        self.failures.with_label_values(&["site", &error.metric_label()]).inc();
        tracing::debug!(site = %site.name_any(), error = %error, "reconcile failed");
    }

    pub fn count_and_measure(&self) -> ReconcileMeasurer {
        self.runs.with_label_values(&["site"]).inc();
        ReconcileMeasurer { start: Instant::now(), metric: self.duration.with_label_values(&["site"]) }
    }
}

/// Records reconcile duration into the histogram on drop, mirroring the
/// teacher's RAII timer.
pub struct ReconcileMeasurer {
    start: Instant,
    metric: prometheus::Histogram,
}

impl Drop for ReconcileMeasurer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_millis() as f64 / 1000.0;
        self.metric.observe(duration);
    }
}
