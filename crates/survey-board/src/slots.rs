//! Slot vocabulary for the availability grid.
//!
//! A slot is one checkable cell of the grid: a day column and an hourly row.
//! The grid is fixed at four days and eighteen hours (06:00 through 23:00).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// First hour row of the grid.
pub const FIRST_HOUR: u8 = 6;
/// Last hour row of the grid (inclusive).
pub const LAST_HOUR: u8 = 23;
/// Number of hour rows.
pub const HOUR_COUNT: usize = (LAST_HOUR - FIRST_HOUR + 1) as usize;
/// Number of day columns.
pub const DAY_COUNT: usize = 4;

/// Separator used when a slot set is written into a single cell.
pub const SLOT_SEPARATOR: &str = ", ";

/// Characters appended to hour labels for display ("9:00～").
const DECORATIVE_SUFFIXES: [char; 2] = ['～', '~'];

static SLOT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)-(\d{1,2}):00$").unwrap());

/// Error returned when a slot key does not belong to the grid vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotParseError {
    #[error("Unknown day `{0}`")]
    UnknownDay(String),

    #[error("Hour {0} is outside the survey grid")]
    HourOutOfRange(u8),

    #[error("Unrecognized slot `{0}`")]
    Malformed(String),
}

/// A day column. Declaration order is the display order of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Sat,
    Sun,
    Mon,
    Fri,
}

impl Day {
    pub const ALL: [Day; DAY_COUNT] = [Day::Sat, Day::Sun, Day::Mon, Day::Fri];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Sat => "Sat",
            Day::Sun => "Sun",
            Day::Mon => "Mon",
            Day::Fri => "Fri",
        }
    }

    /// Column index in the grid.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column header shown above the grid. Weekend days carry a colour marker.
    pub fn label(self) -> &'static str {
        match self {
            Day::Sat => "🟦 Sat",
            Day::Sun => "🟥 Sun",
            Day::Mon => "Mon",
            Day::Fri => "Fri",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| SlotParseError::UnknownDay(s.to_string()))
    }
}

/// A whole hour between [`FIRST_HOUR`] and [`LAST_HOUR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    pub fn new(hour: u8) -> Result<Self, SlotParseError> {
        if (FIRST_HOUR..=LAST_HOUR).contains(&hour) {
            Ok(Self(hour))
        } else {
            Err(SlotParseError::HourOutOfRange(hour))
        }
    }

    /// All grid hours in ascending order.
    pub fn all() -> impl Iterator<Item = Hour> {
        (FIRST_HOUR..=LAST_HOUR).map(Hour)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Row index in the grid.
    pub fn index(self) -> usize {
        (self.0 - FIRST_HOUR) as usize
    }

    /// Row header shown beside the grid, e.g. `9:00～`.
    pub fn label(self) -> String {
        format!("{}:00～", self.0)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

/// One (day, hour) cell of the grid.
///
/// Ordering is by day in grid order, then by hour. Rankings use this
/// ordering to break ties between equally popular slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    pub day: Day,
    pub hour: Hour,
}

impl SlotId {
    pub fn new(day: Day, hour: Hour) -> Self {
        Self { day, hour }
    }

    /// Every slot in form order: hour rows top to bottom, days left to right.
    pub fn all() -> impl Iterator<Item = SlotId> {
        Hour::all().flat_map(|hour| Day::ALL.into_iter().map(move |day| SlotId { day, hour }))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.hour)
    }
}

impl FromStr for SlotId {
    type Err = SlotParseError;

    /// Accepts `Sat-09:00`, the unpadded `Sat-9:00` and a trailing `～`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().trim_end_matches(DECORATIVE_SUFFIXES).trim_end();
        let caps = SLOT_REGEX
            .captures(token)
            .ok_or_else(|| SlotParseError::Malformed(s.to_string()))?;

        let day = caps[1].parse::<Day>()?;
        let hour = caps[2]
            .parse::<u8>()
            .map_err(|_| SlotParseError::Malformed(s.to_string()))?;

        Ok(Self {
            day,
            hour: Hour::new(hour)?,
        })
    }
}

impl TryFrom<String> for SlotId {
    type Error = SlotParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(slot: SlotId) -> Self {
        slot.to_string()
    }
}

pub type SlotSet = BTreeSet<SlotId>;

/// Writes a slot set into its single-cell form, e.g. `Sat-09:00, Sun-10:00`.
pub fn encode_slots(slots: &SlotSet) -> String {
    slots
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(SLOT_SEPARATOR)
}

/// Result of decoding one stored selection cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSlots {
    pub slots: SlotSet,
    /// Tokens that were present but did not name a grid slot.
    pub dropped: usize,
}

/// Decodes a stored selection cell. Never fails: tokens that are not grid
/// slots are counted in [`DecodedSlots::dropped`], blank tokens are ignored.
pub fn decode_slots(cell: &str) -> DecodedSlots {
    let mut decoded = DecodedSlots::default();

    for token in cell.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<SlotId>() {
            Ok(slot) => {
                decoded.slots.insert(slot);
            }
            Err(_) => decoded.dropped += 1,
        }
    }

    decoded
}
