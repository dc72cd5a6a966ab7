use chrono::NaiveDateTime;
use thiserror::Error;

use crate::report::MetricSummary;

/// Failures raised by the calendar, the classifier and the aggregator.
///
/// All of them are deterministic logic errors over fixed inputs, so none is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A floating holiday rule names a month outside 1..=12.
    #[error("invalid floating holiday configuration for '{rule}': month {month} is not in 1..=12")]
    Config { rule: String, month: u32 },

    /// No strategy in the chain produced a rate for the timestamp.
    #[error("no rate strategy resolved a rate for {timestamp}, check the strategy chain")]
    ClassificationExhausted { timestamp: NaiveDateTime },

    /// The per-rate buckets do not add up to the grand total.
    #[error("data integrity error: grand total {grand_total:?} does not match sum of rate types {summed:?}")]
    Validation {
        summed: MetricSummary,
        grand_total: MetricSummary,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
