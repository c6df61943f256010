//! Collector tests against a scripted admin console.

#[path = "../common/mod.rs"]
mod common;

mod databases;
mod lists;
mod pools;
mod stats;

use prometheus::{Registry, proto::MetricFamily};

/// Find a gathered family by name.
pub fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
    families
        .iter()
        .find(|m| m.name() == name)
        .unwrap_or_else(|| panic!("{name} should be registered"))
}

/// Label value of `name` on the first series of `family`.
pub fn label<'a>(family: &'a MetricFamily, name: &str) -> Option<&'a str> {
    family
        .get_metric()
        .first()?
        .get_label()
        .iter()
        .find(|l| l.name() == name)
        .map(|l| l.value())
}

pub fn gather(registry: &Registry) -> Vec<MetricFamily> {
    registry.gather()
}

/// Gauge value of the `index`th series of `family`.
pub fn gauge(family: &MetricFamily, index: usize) -> Option<f64> {
    family
        .get_metric()
        .get(index)
        .map(|m| m.get_gauge().value())
}
