use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{FixedHoliday, FloatingHoliday, HolidaySettings};
use crate::error::{Error, Result};

const OBSERVED_SUFFIX: &str = " (Observed)";

/// Holiday dates of one year, ascending, with display names.
pub type YearHolidays = BTreeMap<NaiveDate, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidayRule {
    Fixed(FixedHoliday),
    Floating(FloatingHoliday),
}

impl HolidayRule {
    pub fn name(&self) -> &str {
        match self {
            HolidayRule::Fixed(rule) => &rule.name,
            HolidayRule::Floating(rule) => &rule.name,
        }
    }

    /// The date this rule falls on in `year`, `None` when it has no date that year.
    pub fn resolve(&self, year: i32) -> Result<Option<NaiveDate>> {
        match self {
            HolidayRule::Fixed(rule) => {
                let date = NaiveDate::from_ymd_opt(year, rule.month, rule.day);
                if date.is_none() {
                    warn!("{}: {}/{} does not exist in {}, skipped", rule.name, rule.month, rule.day, year);
                }
                Ok(date)
            }
            HolidayRule::Floating(rule) => nth_weekday_of_month(year, rule),
        }
    }
}

fn nth_weekday_of_month(year: i32, rule: &FloatingHoliday) -> Result<Option<NaiveDate>> {
    if !(1..=12).contains(&rule.month) {
        return Err(Error::Config { rule: rule.name.clone(), month: rule.month });
    }
    let Some(first) = NaiveDate::from_ymd_opt(year, rule.month, 1) else {
        return Ok(None);
    };
    let matching: Vec<NaiveDate> = first
        .iter_days()
        .take_while(|d| d.month() == rule.month)
        .filter(|d| d.weekday() == rule.weekday)
        .collect();

    let index = match rule.instance {
        n if n > 0 => usize::try_from(n - 1).ok(),
        n if n < 0 => matching.len().checked_sub(n.unsigned_abs() as usize),
        _ => None,
    };
    Ok(index.and_then(|i| matching.get(i).copied()))
}

/// Resolves configured holidays per year and remembers the result for the calendar's lifetime.
///
/// Rules are applied fixed-first, each in configuration order; when two rules land on the same
/// date the first one keeps its name. With weekend observance on, a Saturday holiday is also
/// observed on the Friday before and a Sunday holiday on the Monday after, unless that day is
/// already a holiday in its own right.
#[derive(Debug)]
pub struct HolidayCalendar {
    rules: Vec<HolidayRule>,
    observe_weekends: bool,
    cache: Mutex<HashMap<i32, Arc<YearHolidays>>>,
}

impl HolidayCalendar {
    pub fn new(rules: Vec<HolidayRule>, observe_weekends: bool) -> Self {
        Self {
            rules,
            observe_weekends,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &HolidaySettings) -> Self {
        let rules = settings
            .fixed
            .iter()
            .cloned()
            .map(HolidayRule::Fixed)
            .chain(settings.floating.iter().cloned().map(HolidayRule::Floating))
            .collect();
        Self::new(rules, settings.observe_weekends)
    }

    pub fn holidays_for_year(&self, year: i32) -> Result<BTreeSet<NaiveDate>> {
        Ok(self.holidays_with_names(year)?.keys().copied().collect())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.holidays_with_names(date.year())?.contains_key(&date))
    }

    pub fn name_of(&self, date: NaiveDate) -> Result<Option<String>> {
        Ok(self.holidays_with_names(date.year())?.get(&date).cloned())
    }

    /// The lock is held while a missing year is built, so a year is never built twice.
    /// A failed build is not cached and fails again on the next call.
    pub fn holidays_with_names(&self, year: i32) -> Result<Arc<YearHolidays>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(holidays) = cache.get(&year) {
            return Ok(Arc::clone(holidays));
        }
        let holidays = Arc::new(self.build(year)?);
        cache.insert(year, Arc::clone(&holidays));
        Ok(holidays)
    }

    pub fn cached_years(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn build(&self, year: i32) -> Result<YearHolidays> {
        let mut holidays = YearHolidays::new();
        for rule in &self.rules {
            if let Some(date) = rule.resolve(year)? {
                holidays.entry(date).or_insert_with(|| rule.name().to_string());
            }
        }

        if self.observe_weekends {
            let mut observed = YearHolidays::new();
            for (date, name) in &holidays {
                let shifted = match date.weekday() {
                    Weekday::Sat => *date - Duration::days(1),
                    Weekday::Sun => *date + Duration::days(1),
                    _ => continue,
                };
                if !holidays.contains_key(&shifted) {
                    observed.entry(shifted).or_insert_with(|| format!("{name}{OBSERVED_SUFFIX}"));
                }
            }
            holidays.extend(observed);
        }

        debug!("HolidayCalendar::build: {} holidays in {}: {:?}", holidays.len(), year, holidays);
        Ok(holidays)
    }
}
