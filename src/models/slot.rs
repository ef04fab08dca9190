use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A bookable window on a single day. Two slots are the same slot only when
/// both bounds match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotParseError {
    #[error("invalid time: {0}")]
    InvalidTime(String),
    #[error("invalid slot label: {0}")]
    InvalidLabel(String),
    #[error("slot must end after it starts: {0}")]
    EmptyRange(String),
}

impl Slot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Result<Self, SlotParseError> {
        if start_time >= end_time {
            return Err(SlotParseError::EmptyRange(format!(
                "{}-{}",
                format_hhmm(&start_time),
                format_hhmm(&end_time)
            )));
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    pub fn from_hhmm(start: &str, end: &str) -> Result<Self, SlotParseError> {
        Self::new(parse_hhmm(start)?, parse_hhmm(end)?)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Display label, e.g. `9:00 AM - 10:00 AM`.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            format_12h(&self.start_time),
            format_12h(&self.end_time)
        )
    }

    /// `HH:MM-HH:MM`, the form used in configuration.
    pub fn key(&self) -> String {
        format!(
            "{}-{}",
            format_hhmm(&self.start_time),
            format_hhmm(&self.end_time)
        )
    }

    /// Parses a slot label. Whitespace is ignored, and each half may use
    /// either the 12-hour display clock (`12:00 PM`) or the 24-hour clock
    /// (`12:00`).
    pub fn parse_label(label: &str) -> Result<Self, SlotParseError> {
        let compact: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        let parts: Vec<&str> = compact.split('-').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(SlotParseError::InvalidLabel(label.to_string()));
        }

        Self::new(parse_clock(parts[0])?, parse_clock(parts[1])?)
    }
}

pub fn parse_hhmm(s: &str) -> Result<NaiveTime, SlotParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| SlotParseError::InvalidTime(s.to_string()))
}

pub fn format_hhmm(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn format_12h(t: &NaiveTime) -> String {
    let (is_pm, hour) = t.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {suffix}", t.minute())
}

// Accepts `9:00AM`, `12:00PM`, `09:00`, `21:00` (whitespace already removed).
fn parse_clock(s: &str) -> Result<NaiveTime, SlotParseError> {
    let invalid = || SlotParseError::InvalidTime(s.to_string());

    let (digits, meridiem) = if let Some(rest) = s.strip_suffix("AM") {
        (rest, Some(false))
    } else if let Some(rest) = s.strip_suffix("PM") {
        (rest, Some(true))
    } else {
        (s, None)
    };

    let (h, m) = digits.split_once(':').ok_or_else(invalid)?;
    if m.len() != 2 || h.is_empty() || h.len() > 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;

    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return Err(invalid()),
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_hhmm(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}
