//! Table-driven mapping from decoded API records onto metric families.
//!
//! Each collector declares static tables of [`ScalarField`], [`TimerField`]
//! and [`BucketGroup`] entries; one table entry binds one record field (or
//! group of fields) to one family. The tables are the entire translation
//! contract: building the families, seeding their label children and
//! applying a scrape all iterate the same entries, which keeps the exported
//! surface and the written values structurally identical by construction.

use grafana_client::Timer;
use prometheus::{Gauge, GaugeVec, Opts};

use crate::NAMESPACE;

/// Fixed label set of every timer family, one child per summary statistic.
pub const TIMER_LABELS: [&str; 9] = [
    "count", "max", "mean", "min", "p25", "p75", "p90", "p99", "std",
];

/// Label key of timer families.
pub const TIMER_LABEL_KEY: &str = "metric";

/// One scalar record field mapped onto a scalar gauge.
pub struct ScalarField<R: 'static> {
    pub name: &'static str,
    pub help: &'static str,
    pub read: fn(&R) -> f64,
}

/// One timer record field mapped onto a `GaugeVec` keyed by statistic name.
pub struct TimerField<R: 'static> {
    pub name: &'static str,
    pub help: &'static str,
    pub read: fn(&R) -> &Timer,
}

/// A group of mutually exclusive categorical fields mapped onto one
/// `GaugeVec`, one label value per enumerant. Exclusive groups are reset
/// before each successful scrape's values are written, so a bucket that
/// disappears upstream cannot keep exposing a stale value.
pub struct BucketGroup<R: 'static> {
    pub name: &'static str,
    pub help: &'static str,
    pub label: &'static str,
    pub buckets: &'static [(&'static str, fn(&R) -> f64)],
}

fn family_opts(subsystem: &str, name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(subsystem)
}

/// Builds one gauge per scalar table entry, in table order.
pub fn scalar_gauges<R>(
    subsystem: &str,
    fields: &[ScalarField<R>],
) -> prometheus::Result<Vec<Gauge>> {
    fields
        .iter()
        .map(|f| Gauge::with_opts(family_opts(subsystem, f.name, f.help)))
        .collect()
}

/// Builds one vector per timer table entry with all nine statistic children
/// pre-created at zero, so the surface is complete before the first scrape.
pub fn timer_vecs<R>(
    subsystem: &str,
    fields: &[TimerField<R>],
) -> prometheus::Result<Vec<GaugeVec>> {
    fields
        .iter()
        .map(|f| {
            let vec = GaugeVec::new(
                family_opts(subsystem, f.name, f.help),
                &[TIMER_LABEL_KEY],
            )?;
            for label in TIMER_LABELS {
                vec.with_label_values(&[label]);
            }
            Ok(vec)
        })
        .collect()
}

/// Builds one vector per bucket group with every enumerant pre-created at
/// zero.
pub fn bucket_vecs<R>(
    subsystem: &str,
    groups: &[BucketGroup<R>],
) -> prometheus::Result<Vec<GaugeVec>> {
    groups
        .iter()
        .map(|g| {
            let vec = GaugeVec::new(family_opts(subsystem, g.name, g.help), &[g.label])?;
            for &(value, _) in g.buckets {
                vec.with_label_values(&[value]);
            }
            Ok(vec)
        })
        .collect()
}

/// Writes all nine statistics of one timer into its vector. Counts and
/// bounds are integer upstream and cast losslessly; the percentile fields
/// are already floats.
pub fn write_timer(vec: &GaugeVec, timer: &Timer) {
    vec.with_label_values(&["count"]).set(timer.count as f64);
    vec.with_label_values(&["max"]).set(timer.max as f64);
    vec.with_label_values(&["mean"]).set(timer.mean);
    vec.with_label_values(&["min"]).set(timer.min as f64);
    vec.with_label_values(&["p25"]).set(timer.p25);
    vec.with_label_values(&["p75"]).set(timer.p75);
    vec.with_label_values(&["p90"]).set(timer.p90);
    vec.with_label_values(&["p99"]).set(timer.p99);
    vec.with_label_values(&["std"]).set(timer.std);
}

/// Resets an exclusive group and repopulates every bucket from the record.
pub fn write_buckets<R>(vec: &GaugeVec, group: &BucketGroup<R>, record: &R) {
    vec.reset();
    for &(value, read) in group.buckets {
        vec.with_label_values(&[value]).set(read(record));
    }
}
