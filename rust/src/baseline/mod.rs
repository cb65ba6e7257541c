//! Baselines and plan-vs-actual variance with earned value metrics.

mod compare;
mod evm;
mod snapshot;
mod variance;

pub use compare::{compare_baselines, BaselineComparison, SnapshotChange};
pub use evm::{EvmMetrics, EvmStatus};
pub use snapshot::{create_baseline, Baseline, BaselineError, BaselineSummary, TaskSnapshot};
pub use variance::{analyze_variance, ChangeKind, TaskVariance, VarianceReport, VarianceSummary};
