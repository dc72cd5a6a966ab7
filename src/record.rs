use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Deserialize;
use sscanf::sscanf;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATE: &str = "Date";
const TIME: &str = "Time";
const DATE_TIME: &str = "Date/Time";
const PRODUCED: &str = "Energy Produced (Wh)";
const CONSUMED: &str = "Energy Consumed (Wh)";

/// One metering interval. Export and import are derived from it, never stored on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRecord {
    pub timestamp: NaiveDateTime,
    pub produced: Decimal,
    pub consumed: Decimal,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Time", default)]
    time: Option<String>,
    #[serde(rename = "Date/Time", default)]
    date_time: Option<String>,
    #[serde(rename = "Energy Produced (Wh)")]
    produced: String,
    #[serde(rename = "Energy Consumed (Wh)")]
    consumed: String,
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_time_of_day(hhmmss: &str) -> Result<NaiveTime> {
    let (hh, mm, ss) = sscanf!(hhmmss, "{u32}:{u32}:{u32}")
        .or_else(|_| sscanf!(hhmmss, "{u32}:{u32}").map(|(hh, mm)| (hh, mm, 0)))
        .map_err(|e| anyhow!("parse_time_of_day: '{}': {}", hhmmss, e))?;
    NaiveTime::from_hms_opt(hh, mm, ss).with_context(|| format!("parse_time_of_day: '{}' is not a time of day", hhmmss))
}

fn parse_date(mmddyyyy: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(mmddyyyy, "%m/%d/%Y")
        .with_context(|| format!("parse_date: '{}' is not MM/DD/YYYY", mmddyyyy))
}

fn parse_quantity(column: &str, value: &str) -> Result<Decimal> {
    value
        .parse::<Decimal>()
        .with_context(|| format!("'{}' value '{}' is not a decimal number", column, value))
}

impl CsvRow {
    fn timestamp(&self) -> Result<NaiveDateTime> {
        match (&self.date_time, &self.date, &self.time) {
            (Some(date_time), _, _) => {
                let (date, time) = date_time
                    .trim()
                    .split_once(char::is_whitespace)
                    .with_context(|| format!("'{}' value '{}' has no time part", DATE_TIME, date_time))?;
                Ok(parse_date(date)?.and_time(parse_time_of_day(time.trim())?))
            }
            (None, Some(date), Some(time)) => Ok(parse_date(date)?.and_time(parse_time_of_day(time)?)),
            _ => Err(anyhow!("missing timestamp, expected '{}' or '{}' and '{}'", DATE_TIME, DATE, TIME)),
        }
    }

    fn into_record(self) -> Result<GenerationRecord> {
        Ok(GenerationRecord {
            timestamp: self.timestamp()?,
            produced: parse_quantity(PRODUCED, &self.produced)?,
            consumed: parse_quantity(CONSUMED, &self.consumed)?,
        })
    }
}

fn validate_headers(headers: &StringRecord) -> Result<()> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    for required in [PRODUCED, CONSUMED] {
        if !has(required) {
            return Err(anyhow!("CSV header validation error: missing column '{}'", required));
        }
    }
    if !has(DATE_TIME) && !(has(DATE) && has(TIME)) {
        return Err(anyhow!(
            "CSV header validation error: expected '{}' or both '{}' and '{}'",
            DATE_TIME, DATE, TIME
        ));
    }
    Ok(())
}

/// Reads generation records from CSV with a header row. Extra columns are ignored.
pub fn read_records<R: Read>(source: R) -> Result<Vec<GenerationRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    validate_headers(&headers)?;

    reader
        .records()
        .map(|record| -> Result<GenerationRecord> {
            let r = record?;
            let line = r.position().map_or(0, |p| p.line());
            debug!("read_records: line {}: {:?}", line, r);
            r.deserialize::<CsvRow>(Some(&headers))
                .map_err(anyhow::Error::from)
                .and_then(CsvRow::into_record)
                .with_context(|| format!("data format error at line {}", line))
        })
        .collect() // 1st error, or the vector
}

pub fn load_records(path: &Path) -> Result<Vec<GenerationRecord>> {
    info!("load_records: loading CSV file {}", path.display());
    let file = File::open(path).with_context(|| format!("CSV file not found: {}", path.display()))?;
    let records = read_records(file).with_context(|| format!("unable to parse {}", path.display()))?;
    info!("load_records: parsed {} records", records.len());
    Ok(records)
}
