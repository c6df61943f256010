//! Metric collectors.
//!
//! Each collector reads one record kind through the [`Store`] and publishes it
//! as Prometheus gauges. Gauges are reset before every read so entries that
//! disappeared from the console (dropped pools, removed databases) disappear
//! from the exposition too.

use crate::store::{AdminConnection, Context, Store};
use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::Registry;
use std::collections::HashMap;

#[macro_use]
mod register_macro;

pub trait Collector {
    fn name(&self) -> &'static str;

    fn enabled_by_default(&self) -> bool;

    fn register_metrics(&self, registry: &Registry) -> Result<()>;

    fn collect<'a, C: AdminConnection>(
        &'a self,
        store: &'a Store<C>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>>;
}

// THIS IS THE ONLY PLACE YOU NEED TO ADD NEW COLLECTORS
register_collectors! {
    stats => StatsCollector,
    pools => PoolsCollector,
    databases => DatabasesCollector,
    lists => ListsCollector,
}

pub mod config;
pub mod registry;

/// Console counters fit comfortably in an f64 mantissa.
#[allow(clippy::cast_precision_loss)]
#[inline]
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    value as f64
}
