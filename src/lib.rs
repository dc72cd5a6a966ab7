//! Splits net-metered generation records into on-peak and off-peak volumes.
//!
//! A record is off-peak on a holiday (observed days included) or a weekend, otherwise the
//! weekday peak schedule decides. The report also carries weekend and per-holiday subtotals
//! and is checked against its own grand total before it is handed out.

pub mod calendar;
pub mod config;
pub mod error;
pub mod rate;
pub mod record;
pub mod render;
pub mod report;

use std::sync::Arc;

use crate::calendar::HolidayCalendar;
use crate::config::Settings;
use crate::rate::RateClassifier;
use crate::report::ReportAggregator;

/// Calendar, classifier and aggregator wired together from one set of settings.
#[derive(Debug, Clone)]
pub struct Engine {
    pub calendar: Arc<HolidayCalendar>,
    pub aggregator: ReportAggregator,
}

impl Engine {
    pub fn from_settings(settings: &Settings) -> Self {
        let calendar = Arc::new(HolidayCalendar::from_settings(&settings.holidays));
        let classifier = RateClassifier::standard(Arc::clone(&calendar), settings.peak_hours.clone());
        let aggregator = ReportAggregator::new(classifier, Arc::clone(&calendar));
        Self { calendar, aggregator }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::RateType;
    use crate::record::load_records;
    use crate::render::render_report;
    use anyhow::Result;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::path::Path;

    // very similar to main
    #[test]
    fn test_report_from_files() -> Result<()> {
        let settings = Settings::load(Path::new("data/test/settings.toml"))?;
        let engine = Engine::from_settings(&settings);
        let records = load_records(Path::new("data/test/generation.csv"))?;
        let report = engine.aggregator.aggregate(&records)?;

        let on_peak = report.summaries[&RateType::OnPeak];
        assert_eq!(on_peak.produced, dec!(1750.5));
        assert_eq!(on_peak.consumed, dec!(500.25));
        assert_eq!(on_peak.export, dec!(1250.25));
        assert_eq!(on_peak.import, dec!(0));

        let off_peak = report.summaries[&RateType::OffPeak];
        assert_eq!(off_peak.produced, dec!(4500));
        assert_eq!(off_peak.consumed, dec!(2300));
        assert_eq!(off_peak.export, dec!(3000));
        assert_eq!(off_peak.import, dec!(800));

        assert_eq!(report.grand_total.produced, dec!(6250.5));
        assert_eq!(report.grand_total.export, dec!(4250.25));
        assert_eq!(report.grand_total.import, dec!(800));

        assert_eq!(report.weekend_total.produced, dec!(2700));
        assert_eq!(report.weekend_total.import, dec!(200));

        let names: Vec<(NaiveDate, &str)> =
            report.holiday_summaries.iter().map(|(date, h)| (*date, h.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (NaiveDate::from_ymd_opt(2026, 7, 3).unwrap(), "Independence Day (Observed)"),
                (NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(), "Independence Day"),
            ]
        );
        assert_eq!(report.holiday_summaries.values().map(|h| h.summary.export).sum::<Decimal>(), dec!(3000));

        let text = render_report(&report);
        println!("{}", text);
        assert!(text.contains("1,250"));
        assert!(text.contains("Independence Day (Observed) (2026-07-03)"));
        Ok(())
    }

    #[test]
    fn test_default_settings_match_test_file() -> Result<()> {
        let from_file = Engine::from_settings(&Settings::load(Path::new("data/test/settings.toml"))?);
        let built_in = Engine::from_settings(&Settings::us_default());
        for year in [2022, 2026, 2030] {
            assert_eq!(from_file.calendar.holidays_with_names(year)?, built_in.calendar.holidays_with_names(year)?);
        }
        Ok(())
    }
}
