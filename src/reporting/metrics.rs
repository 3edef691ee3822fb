use crate::errors::{Result, ResultExt};
use crate::reporting::prometheus_u64::U64CounterVec;
use crate::reporting::SyncReport;
use crate::sync::action::Classification;
use prometheus::{Encoder, Histogram, HistogramOpts, Registry, TextEncoder};

pub struct Metrics {
    pub outcome_count_metric: U64CounterVec,
    pub rows_pulled_metric: U64CounterVec,
    pub sync_time_metric: Histogram,
}

impl Metrics {
    pub fn register(registry: &Registry) -> Result<Metrics> {
        let outcome_count_metric = register_u64_counter_vec!(
            registry,
            "merge_sync_outcomes_total",
            "The amount of keys classified, per classification",
            &["classification"]
        )?;
        let rows_pulled_metric = register_u64_counter_vec!(
            registry,
            "merge_sync_rows_pulled_total",
            "The amount of rows pulled from each adapter",
            &["side"]
        )?;

        let sync_time_metric = Histogram::with_opts(HistogramOpts::new(
            "merge_sync_duration_seconds",
            "The time spent on a complete sync run",
        ))?;
        registry.register(Box::new(sync_time_metric.clone()))?;

        Ok(Metrics {
            outcome_count_metric,
            rows_pulled_metric,
            sync_time_metric,
        })
    }

    pub fn observe(&self, report: &SyncReport) {
        for classification in Classification::ALL.iter() {
            self.outcome_count_metric
                .with_label_values(&[classification.as_str()])
                .inc_by(report.counts.get(*classification));
        }

        self.rows_pulled_metric
            .with_label_values(&["left"])
            .inc_by(report.merge.left_pulled);
        self.rows_pulled_metric
            .with_label_values(&["right"])
            .inc_by(report.merge.right_pulled);
        self.sync_time_metric.observe(report.elapsed.as_secs_f64());
    }
}

/// Renders the registry in the prometheus text exposition format.
pub fn render(registry: &Registry) -> Result<String> {
    let mut buffer = vec![];
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;

    String::from_utf8(buffer).chain_err(|| "Metrics output is not valid UTF-8")
}
