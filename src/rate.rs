use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use log::debug;
use std::fmt;
use std::sync::Arc;

use crate::calendar::HolidayCalendar;
use crate::config::PeakHoursSettings;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RateType {
    OnPeak,
    OffPeak,
}

impl RateType {
    pub const ALL: [RateType; 2] = [RateType::OnPeak, RateType::OffPeak];
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateType::OnPeak => write!(f, "On-Peak"),
            RateType::OffPeak => write!(f, "Off-Peak"),
        }
    }
}

pub fn is_weekend(timestamp: &NaiveDateTime) -> bool {
    matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun)
}

/// One link of the classification chain: either a definitive rate or `None` to pass it on.
#[derive(Debug, Clone)]
pub enum RateStrategy {
    /// Holidays (including observed days) are off-peak.
    Holiday(Arc<HolidayCalendar>),
    /// Saturdays and Sundays are off-peak.
    Weekend,
    /// Monday to Friday: on-peak inside the day's window, off-peak otherwise.
    Weekday(PeakHoursSettings),
}

impl RateStrategy {
    pub fn classify(&self, timestamp: &NaiveDateTime) -> Result<Option<RateType>> {
        match self {
            RateStrategy::Holiday(calendar) => Ok(calendar
                .is_holiday(timestamp.date())?
                .then_some(RateType::OffPeak)),
            RateStrategy::Weekend => Ok(is_weekend(timestamp).then_some(RateType::OffPeak)),
            RateStrategy::Weekday(peak_hours) => {
                if is_weekend(timestamp) {
                    return Ok(None);
                }
                let on_peak = peak_hours
                    .daily_schedules
                    .get(&timestamp.weekday())
                    .is_some_and(|window| window.contains(timestamp.hour()));
                Ok(Some(if on_peak { RateType::OnPeak } else { RateType::OffPeak }))
            }
        }
    }
}

/// Ordered strategy chain; the first strategy with an opinion decides.
#[derive(Debug, Clone)]
pub struct RateClassifier {
    strategies: Vec<RateStrategy>,
}

impl RateClassifier {
    pub fn new(strategies: Vec<RateStrategy>) -> Self {
        Self { strategies }
    }

    /// Holiday, then weekend, then the weekday peak schedule.
    pub fn standard(calendar: Arc<HolidayCalendar>, peak_hours: PeakHoursSettings) -> Self {
        Self::new(vec![
            RateStrategy::Holiday(calendar),
            RateStrategy::Weekend,
            RateStrategy::Weekday(peak_hours),
        ])
    }

    /// Fails instead of defaulting when no strategy answers: that is a broken chain, not off-peak.
    pub fn classify(&self, timestamp: &NaiveDateTime) -> Result<RateType> {
        for strategy in &self.strategies {
            if let Some(rate) = strategy.classify(timestamp)? {
                debug!("RateClassifier::classify: {} -> {}", timestamp, rate);
                return Ok(rate);
            }
        }
        Err(Error::ClassificationExhausted { timestamp: *timestamp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HolidayRule;
    use crate::config::{FixedHoliday, PeakWindow};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn weekdays_7_to_19() -> PeakHoursSettings {
        PeakHoursSettings {
            daily_schedules: [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
                .into_iter()
                .map(|day| (day, PeakWindow { start_hour: 7, end_hour: 19 }))
                .collect(),
        }
    }

    fn christmas_calendar() -> Arc<HolidayCalendar> {
        let rule = HolidayRule::Fixed(FixedHoliday { name: "Christmas".to_string(), month: 12, day: 25 });
        Arc::new(HolidayCalendar::new(vec![rule], true))
    }

    #[test]
    fn test_weekday_strategy() -> Result<()> {
        let strategy = RateStrategy::Weekday(weekdays_7_to_19());
        // 2026-01-05 is a Monday.
        assert_eq!(strategy.classify(&at(2026, 1, 5, 6))?, Some(RateType::OffPeak));
        assert_eq!(strategy.classify(&at(2026, 1, 5, 7))?, Some(RateType::OnPeak));
        assert_eq!(strategy.classify(&at(2026, 1, 5, 18))?, Some(RateType::OnPeak));
        assert_eq!(strategy.classify(&at(2026, 1, 5, 19))?, Some(RateType::OffPeak));
        assert_eq!(strategy.classify(&at(2026, 1, 10, 12))?, None);
        Ok(())
    }

    #[test]
    fn test_weekday_without_window_is_off_peak() -> Result<()> {
        let mut peak_hours = weekdays_7_to_19();
        peak_hours.daily_schedules.remove(&Weekday::Wed);
        let strategy = RateStrategy::Weekday(peak_hours);
        assert_eq!(strategy.classify(&at(2026, 1, 7, 12))?, Some(RateType::OffPeak));
        Ok(())
    }

    #[test]
    fn test_weekend_strategy() -> Result<()> {
        assert_eq!(RateStrategy::Weekend.classify(&at(2026, 1, 10, 12))?, Some(RateType::OffPeak));
        assert_eq!(RateStrategy::Weekend.classify(&at(2026, 1, 11, 12))?, Some(RateType::OffPeak));
        assert_eq!(RateStrategy::Weekend.classify(&at(2026, 1, 9, 12))?, None);
        Ok(())
    }

    #[test]
    fn test_holiday_strategy() -> Result<()> {
        let strategy = RateStrategy::Holiday(christmas_calendar());
        assert_eq!(strategy.classify(&at(2026, 12, 25, 12))?, Some(RateType::OffPeak));
        assert_eq!(strategy.classify(&at(2026, 12, 24, 12))?, None);
        Ok(())
    }

    #[test]
    fn test_holiday_beats_weekday_peak() -> Result<()> {
        // Christmas 2026 is a Friday inside the peak window.
        let classifier = RateClassifier::standard(christmas_calendar(), weekdays_7_to_19());
        assert_eq!(classifier.classify(&at(2026, 12, 25, 12))?, RateType::OffPeak);
        assert_eq!(classifier.classify(&at(2026, 12, 24, 12))?, RateType::OnPeak);
        Ok(())
    }

    #[test]
    fn test_observed_holiday_is_off_peak() -> Result<()> {
        // Christmas 2022 is a Sunday, observed Monday Dec 26.
        let classifier = RateClassifier::standard(christmas_calendar(), weekdays_7_to_19());
        assert_eq!(classifier.classify(&at(2022, 12, 26, 12))?, RateType::OffPeak);
        Ok(())
    }

    #[test]
    fn test_weekend_beats_weekday_schedule() -> Result<()> {
        let mut peak_hours = weekdays_7_to_19();
        peak_hours.daily_schedules.insert(Weekday::Sat, PeakWindow { start_hour: 0, end_hour: 24 });
        let classifier = RateClassifier::standard(christmas_calendar(), peak_hours);
        assert_eq!(classifier.classify(&at(2026, 1, 10, 12))?, RateType::OffPeak);
        Ok(())
    }

    #[test]
    fn test_chain_without_weekday_fallback_fails() {
        let classifier = RateClassifier::new(vec![RateStrategy::Holiday(christmas_calendar()), RateStrategy::Weekend]);
        let err = classifier.classify(&at(2026, 1, 5, 12)).unwrap_err();
        assert!(matches!(err, Error::ClassificationExhausted { timestamp } if timestamp == at(2026, 1, 5, 12)));
    }

    #[test]
    fn test_empty_chain_never_defaults_to_off_peak() {
        let classifier = RateClassifier::new(Vec::new());
        assert!(classifier.classify(&at(2026, 1, 10, 3)).is_err());
    }

    #[test]
    fn test_standard_chain_is_exhaustive() -> Result<()> {
        let classifier = RateClassifier::standard(christmas_calendar(), PeakHoursSettings::default());
        let start = at(2026, 12, 20, 0);
        for hour in 0..(14 * 24) {
            classifier.classify(&(start + chrono::Duration::hours(hour)))?;
        }
        Ok(())
    }

    #[test]
    fn test_calendar_config_error_propagates() {
        let rule = HolidayRule::Floating(crate::config::FloatingHoliday {
            name: "Broken".to_string(),
            month: 0,
            weekday: Weekday::Mon,
            instance: 1,
        });
        let calendar = Arc::new(HolidayCalendar::new(vec![rule], false));
        let classifier = RateClassifier::standard(calendar, weekdays_7_to_19());
        assert!(matches!(classifier.classify(&at(2026, 1, 5, 12)), Err(Error::Config { .. })));
    }
}
