use chrono::DateTime;
use chrono::Days;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::sync::LazyLock;

/// Leading decimal prefix accepted by the numeric coercion ("14 days" reads as 14).
static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("Hardcode regex pattern")
});

/// Tokens accepted as an affirmative checkbox-like flag.
const AFFIRMATIVE_TOKENS: [&str; 7] = ["yes", "y", "true", "1", "x", "✓", "checked"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A single untyped cell value of the ledger store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// True for empty cells and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Spreadsheet truthiness: empty, `false`, zero, NaN and empty text are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Cell::Empty => false,
            Cell::Boolean(value) => *value,
            Cell::Number(value) => *value != 0.0 && !value.is_nan(),
            Cell::Text(value) => !value.is_empty(),
            Cell::Date(_) | Cell::DateTime(_) => true,
        }
    }

    /// Reads a checkbox or yes/no style flag.
    pub fn to_flag(&self) -> bool {
        match self {
            Cell::Boolean(value) => *value,
            Cell::Empty => false,
            _ => {
                let text = self.to_string().trim().to_lowercase();
                AFFIRMATIVE_TOKENS.contains(&text.as_str())
            }
        }
    }

    /// Best-effort numeric value; anything without a leading number reads as zero.
    pub fn to_number_or_zero(&self) -> f64 {
        match self {
            Cell::Number(value) if value.is_finite() => *value,
            Cell::Text(value) => NUMBER_PREFIX
                .find(value.trim())
                .and_then(|matcher| matcher.as_str().parse::<f64>().ok())
                .filter(|number| number.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Normalizes the cell into a `Date` or `DateTime` cell, or `None` when it holds no
    /// recognizable date. Plain numbers and booleans are never dates.
    pub fn to_temporal(&self) -> Option<Cell> {
        match self {
            Cell::Date(_) | Cell::DateTime(_) => Some(self.clone()),
            Cell::Text(value) => parse_temporal(value.trim()),
            _ => None,
        }
    }

    /// The cell as a timestamp; date-only values sit at midnight.
    pub fn to_date_time(&self) -> Option<NaiveDateTime> {
        match self.to_temporal()? {
            Cell::Date(date) => Some(date.and_time(NaiveTime::MIN)),
            Cell::DateTime(date_time) => Some(date_time),
            _ => None,
        }
    }

    /// The calendar day of the cell, if it holds a date.
    pub fn to_date(&self) -> Option<NaiveDate> {
        self.to_date_time().map(|date_time| date_time.date())
    }

    /// Moves a date forward by whole calendar days, keeping the time of day and
    /// the date/date-time kind of the cell.
    pub fn add_days(&self, days: u64) -> Option<Cell> {
        match self.to_temporal()? {
            Cell::Date(date) => date.checked_add_days(Days::new(days)).map(Cell::Date),
            Cell::DateTime(date_time) => date_time.checked_add_days(Days::new(days)).map(Cell::DateTime),
            _ => None,
        }
    }

    /// Builds a cell from an Excel serial number in the given date system.
    /// Serials below 60 in the 1900 system are shifted for the Lotus 1-2-3 leap year bug.
    /// Serials outside `MAX_SERIAL` days of the epoch are not dates.
    pub fn from_serial(serial: f64, is_1904: bool, with_time: bool) -> Option<Cell> {
        if !(-MAX_SERIAL..=MAX_SERIAL).contains(&serial) {
            return None;
        }
        let days = serial.trunc() as i64;
        let offset = if is_1904 {
            1_462
        } else if days < 60 {
            1
        } else {
            0
        };
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("Hardcode epoch date");
        let date = epoch.checked_add_signed(Duration::try_days(days + offset)?)?;
        if with_time {
            let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
            Some(Cell::DateTime(date.and_time(NaiveTime::MIN) + Duration::milliseconds(milliseconds)))
        } else {
            Some(Cell::Date(date))
        }
    }
}

/// Day count bound for serial dates, well past year 9999 either way.
const MAX_SERIAL: f64 = 10_000_000.0;

/// Parses the textual date forms people type into a ledger.
fn parse_temporal(value: &str) -> Option<Cell> {
    if value.is_empty() {
        return None;
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(Cell::Date(date));
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|date_time| date_time.naive_local())
        })
        .map(Cell::DateTime)
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Boolean(value) => write!(f, "{}", value),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(value) => f.write_str(value),
            Cell::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Cell::DateTime(date_time) => write!(f, "{}", date_time.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Boolean(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::DateTime(value)
    }
}

/// Raw storage types of worksheet cells, as declared by the `.xlsx` markup and its styles.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    Boolean,
    Number,
    /// Serial number formatted as a date
    NumberDate,
    /// Serial number formatted as a date and time
    NumberDateTime,
    /// Serial number formatted as a time of day
    NumberTime,
    /// ISO 8601 date/time string
    IsoDateTime,
    InlineString,
    /// Index into the shared string table
    SharedString,
    Error,
}

impl CellType {
    /// Classifies built-in Excel number format IDs.
    pub(crate) fn parse_builtin_number_format_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::NumberDateTime),
            "14" | "15" | "16" | "17" => Some(Self::NumberDate),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::NumberTime),
            _ => None,
        }
    }

    /// Classifies a custom number format code by the date and time tokens
    /// it contains outside of quoted literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::NumberDateTime,
            (true, false) => Self::NumberDate,
            (false, true) => Self::NumberTime,
            (false, false) => Self::Number,
        }
    }
}

/// Formats the fractional part of a serial number as `HH:MM:SS`.
pub(crate) fn to_time_string(serial: f64) -> String {
    let mut seconds = (serial.fract() * 86_400f64).round() as i64;
    let hours = seconds / 3_600;
    seconds %= 3_600;
    let minutes = seconds / 60;
    seconds %= 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn flag_tokens() {
        for token in ["yes", " Y ", "TRUE", "1", "x", "✓", "Checked"] {
            assert!(Cell::from(token).to_flag(), "{token}");
        }
        for token in ["no", "", "maybe", "0", "false"] {
            assert!(!Cell::from(token).to_flag(), "{token}");
        }
        assert!(Cell::Boolean(true).to_flag());
        assert!(!Cell::Boolean(false).to_flag());
        assert!(Cell::Number(1.0).to_flag());
        assert!(!Cell::Number(2.0).to_flag());
        assert!(!Cell::Empty.to_flag());
    }

    #[test]
    fn number_coercion() {
        assert_eq!(Cell::Number(14.0).to_number_or_zero(), 14.0);
        assert_eq!(Cell::from(" 7 ").to_number_or_zero(), 7.0);
        assert_eq!(Cell::from("14 days").to_number_or_zero(), 14.0);
        assert_eq!(Cell::from("1.5").to_number_or_zero(), 1.5);
        assert_eq!(Cell::from("weekly").to_number_or_zero(), 0.0);
        assert_eq!(Cell::Number(f64::NAN).to_number_or_zero(), 0.0);
        assert_eq!(Cell::Boolean(true).to_number_or_zero(), 0.0);
        assert_eq!(Cell::Empty.to_number_or_zero(), 0.0);
    }

    #[test]
    fn temporal_parsing() {
        assert_eq!(Cell::from("2024-03-01").to_temporal(), Some(Cell::Date(date(2024, 3, 1))));
        assert_eq!(Cell::from("03/01/2024").to_temporal(), Some(Cell::Date(date(2024, 3, 1))));
        assert_eq!(
            Cell::from("2024-03-01 09:30:00").to_temporal(),
            Some(Cell::DateTime(date(2024, 3, 1).and_hms_opt(9, 30, 0).unwrap()))
        );
        assert_eq!(Cell::from("soon").to_temporal(), None);
        assert_eq!(Cell::Number(45000.0).to_temporal(), None);
        assert_eq!(Cell::Empty.to_date(), None);
    }

    #[test]
    fn add_days_crosses_month_boundaries() {
        let due = Cell::Date(date(2024, 2, 20));
        assert_eq!(due.add_days(14), Some(Cell::Date(date(2024, 3, 5))));

        let due = Cell::DateTime(date(2024, 1, 31).and_hms_opt(23, 15, 0).unwrap());
        assert_eq!(
            due.add_days(1),
            Some(Cell::DateTime(date(2024, 2, 1).and_hms_opt(23, 15, 0).unwrap()))
        );

        assert_eq!(Cell::from("2024-03-01").add_days(14), Some(Cell::Date(date(2024, 3, 15))));
    }

    #[test]
    fn serial_dates() {
        assert_eq!(Cell::from_serial(45352.0, false, false), Some(Cell::Date(date(2024, 3, 1))));
        assert_eq!(Cell::from_serial(1.0, false, false), Some(Cell::Date(date(1900, 1, 1))));
        assert_eq!(Cell::from_serial(0.0, true, false), Some(Cell::Date(date(1904, 1, 1))));
        assert_eq!(
            Cell::from_serial(45352.5, false, true),
            Some(Cell::DateTime(date(2024, 3, 1).and_hms_opt(12, 0, 0).unwrap()))
        );
    }

    #[test]
    fn out_of_range_serials_are_not_dates() {
        assert_eq!(Cell::from_serial(1e12, false, false), None);
        assert_eq!(Cell::from_serial(-1e12, true, true), None);
        assert_eq!(Cell::from_serial(f64::MAX, true, false), None);
        assert_eq!(Cell::from_serial(f64::NAN, false, false), None);
    }

    #[test]
    fn display_matches_host_coercion() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Boolean(true).to_string(), "true");
        assert_eq!(Cell::Date(date(2024, 3, 1)).to_string(), "2024-03-01");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd"), CellType::NumberDate);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm"), CellType::NumberDateTime);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss"), CellType::NumberTime);
        assert_eq!(CellType::parse_custom_number_format("\"days\" 0.00"), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00"), CellType::Number);
        assert_eq!(to_time_string(0.75), "18:00:00");
    }
}
