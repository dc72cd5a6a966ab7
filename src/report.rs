use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::sync::Arc;

use crate::calendar::HolidayCalendar;
use crate::error::{Error, Result};
use crate::rate::{is_weekend, RateClassifier, RateType};
use crate::record::GenerationRecord;

/// Produced / consumed volumes and the export / import they net into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSummary {
    pub produced: Decimal,
    pub consumed: Decimal,
    pub export: Decimal,
    pub import: Decimal,
}

impl MetricSummary {
    /// Nets one record: a surplus is exported, a deficit imported, never both.
    pub fn from_record(record: &GenerationRecord) -> Self {
        let net = record.produced - record.consumed;
        let (export, import) = if net > Decimal::ZERO {
            (net, Decimal::ZERO)
        } else {
            (Decimal::ZERO, net.abs())
        };
        Self {
            produced: record.produced,
            consumed: record.consumed,
            export,
            import,
        }
    }

    pub fn add(&mut self, produced: Decimal, consumed: Decimal, export: Decimal, import: Decimal) {
        self.produced += produced;
        self.consumed += consumed;
        self.export += export;
        self.import += import;
    }

    pub fn merge(&mut self, other: &MetricSummary) {
        self.add(other.produced, other.consumed, other.export, other.import);
    }
}

impl AddAssign for MetricSummary {
    fn add_assign(&mut self, other: MetricSummary) {
        self.merge(&other);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidaySummary {
    pub name: String,
    pub summary: MetricSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportModel {
    /// Always holds every [`RateType`], zero when nothing fell into it.
    pub summaries: BTreeMap<RateType, MetricSummary>,
    pub grand_total: MetricSummary,
    /// Saturdays and Sundays, whatever their rate.
    pub weekend_total: MetricSummary,
    pub holiday_summaries: BTreeMap<NaiveDate, HolidaySummary>,
}

impl Default for ReportModel {
    fn default() -> Self {
        Self {
            summaries: RateType::ALL.into_iter().map(|rate| (rate, MetricSummary::default())).collect(),
            grand_total: MetricSummary::default(),
            weekend_total: MetricSummary::default(),
            holiday_summaries: BTreeMap::new(),
        }
    }
}

impl ReportModel {
    pub fn summary(&self, rate: RateType) -> MetricSummary {
        self.summaries.get(&rate).copied().unwrap_or_default()
    }

    pub fn on_peak(&self) -> MetricSummary {
        self.summary(RateType::OnPeak)
    }

    pub fn off_peak(&self) -> MetricSummary {
        self.summary(RateType::OffPeak)
    }
}

/// Folds generation records into a [`ReportModel`]. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    classifier: RateClassifier,
    calendar: Arc<HolidayCalendar>,
}

impl ReportAggregator {
    pub fn new(classifier: RateClassifier, calendar: Arc<HolidayCalendar>) -> Self {
        Self { classifier, calendar }
    }

    pub fn aggregate<'a, I>(&self, records: I) -> Result<ReportModel>
    where
        I: IntoIterator<Item = &'a GenerationRecord>,
    {
        let mut report = ReportModel::default();
        let mut count = 0usize;

        for record in records {
            let flow = MetricSummary::from_record(record);
            let rate = self.classifier.classify(&record.timestamp)?;
            debug!("ReportAggregator::aggregate: {} {} {:?}", record.timestamp, rate, flow);

            *report.summaries.entry(rate).or_default() += flow;
            report.grand_total += flow;

            if is_weekend(&record.timestamp) {
                report.weekend_total += flow;
            }

            let date = record.timestamp.date();
            if let Some(name) = self.calendar.name_of(date)? {
                report
                    .holiday_summaries
                    .entry(date)
                    .or_insert_with(|| HolidaySummary { name, summary: MetricSummary::default() })
                    .summary += flow;
            }
            count += 1;
        }

        Self::validate_checksums(&report)?;
        info!(
            "ReportAggregator::aggregate: {} records, {} holiday dates",
            count,
            report.holiday_summaries.len()
        );
        Ok(report)
    }

    /// The per-rate buckets must add up to the grand total exactly.
    pub fn validate_checksums(report: &ReportModel) -> Result<()> {
        let mut summed = MetricSummary::default();
        for summary in report.summaries.values() {
            summed.merge(summary);
        }
        if summed != report.grand_total {
            return Err(Error::Validation {
                summed,
                grand_total: report.grand_total,
            });
        }
        Ok(())
    }
}
