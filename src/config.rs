use anyhow::{anyhow, Context, Result};
use chrono::Weekday;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Everything the engine needs, read once at start-up and never changed afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub holidays: HolidaySettings,
    #[serde(default)]
    pub peak_hours: PeakHoursSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HolidaySettings {
    #[serde(default)]
    pub fixed: Vec<FixedHoliday>,
    #[serde(default)]
    pub floating: Vec<FloatingHoliday>,
    /// Shift Saturday holidays to Friday and Sunday holidays to Monday.
    #[serde(default = "default_observe_weekends")]
    pub observe_weekends: bool,
}

impl Default for HolidaySettings {
    fn default() -> Self {
        Self {
            fixed: Vec::new(),
            floating: Vec::new(),
            observe_weekends: default_observe_weekends(),
        }
    }
}

fn default_observe_weekends() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FixedHoliday {
    pub name: String,
    pub month: u32,
    pub day: u32,
}

/// Nth `weekday` of `month`: `instance` 1..=5 counts from the start, -1..=-5 from the end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FloatingHoliday {
    pub name: String,
    pub month: u32,
    pub weekday: Weekday,
    pub instance: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeakHoursSettings {
    /// Weekdays without an entry have no peak window at all.
    #[serde(default)]
    pub daily_schedules: HashMap<Weekday, PeakWindow>,
}

/// Half-open hour interval `[start_hour, end_hour)` on the local 24h clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PeakWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PeakWindow {
    pub fn contains(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings> {
        info!("Settings::load: loading TOML file {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read settings file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// US federal style holidays with a Monday to Friday 07:00-19:00 peak window.
    pub fn us_default() -> Settings {
        let fixed = |name: &str, month, day| FixedHoliday { name: name.to_string(), month, day };
        let floating = |name: &str, month, weekday, instance| FloatingHoliday {
            name: name.to_string(),
            month,
            weekday,
            instance,
        };
        let peak = PeakWindow { start_hour: 7, end_hour: 19 };
        Settings {
            holidays: HolidaySettings {
                fixed: vec![
                    fixed("New Year's Day", 1, 1),
                    fixed("Independence Day", 7, 4),
                    fixed("Christmas", 12, 25),
                ],
                floating: vec![
                    floating("Memorial Day", 5, Weekday::Mon, -1),
                    floating("Labor Day", 9, Weekday::Mon, 1),
                    floating("Thanksgiving", 11, Weekday::Thu, 4),
                ],
                observe_weekends: true,
            },
            peak_hours: PeakHoursSettings {
                daily_schedules: [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
                    .into_iter()
                    .map(|day| (day, peak))
                    .collect(),
            },
        }
    }

    // Floating holiday months are checked by the calendar when a year is built.
    fn validate(&self) -> Result<()> {
        for (day, window) in &self.peak_hours.daily_schedules {
            if window.end_hour > 24 || window.start_hour > window.end_hour {
                return Err(anyhow!(
                    "peak window for {} must satisfy start_hour <= end_hour <= 24, got {}..{}",
                    day, window.start_hour, window.end_hour
                ));
            }
        }
        for rule in &self.holidays.floating {
            if rule.instance == 0 || rule.instance.abs() > 5 {
                return Err(anyhow!(
                    "floating holiday '{}' has instance {}, expected 1..=5 or -5..=-1",
                    rule.name, rule.instance
                ));
            }
        }
        Ok(())
    }
}
