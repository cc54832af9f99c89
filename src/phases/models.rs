//! Phases: the scheduled timepoints of a study
//!
//! A phase name carries its own schedule. In the day/minutes format the
//! short name (token before the first space) matches `d<days>[_<hours>h<minutes>]`
//! and the remainder of the name is a free-text label, e.g. `"d7_14h30 EOT"`.
//! In the number format the short name is a plain ordinal (`"3. Baseline"`).
//! Parsing is tolerant: malformed numeric segments decode to 0 rather than
//! failing, so a half-typed name never breaks the read path.

use crate::common::codecs::parse_leading_int;
use crate::common::models::PhaseId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Naming scheme for the phases of a study.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFormat {
    /// Phases encode a (days, hours, minutes) offset: `d7_14h30 EOT`
    #[default]
    DayMinutes,
    /// Phases are plain ordinals: `3. Baseline`
    Number,
}

impl PhaseFormat {
    /// Build a canonical phase name from a schedule and a label, such that
    /// parsing the result yields the same (days, hours, minutes).
    pub fn format_name(self, days: i32, hours: i32, minutes: i32, label: &str) -> String {
        let mut name = match self {
            PhaseFormat::DayMinutes => {
                let mut short = format!("d{days}");
                if hours != 0 || minutes != 0 {
                    short.push_str(&format!("_{hours}h{minutes:02}"));
                }
                short
            }
            PhaseFormat::Number => format!("{days}."),
        };
        if !label.is_empty() {
            name.push(' ');
            name.push_str(label);
        }
        name
    }
}

/// A named timepoint within a study.
///
/// Equality and ordering follow the parsed schedule: two phases compare
/// equal when their (days, hours, minutes, name) agree, and ordering is
/// lexicographic on that tuple. Identity questions go through [`Phase::id`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub name: String,
    pub format: PhaseFormat,
    /// Versioned randomization blob for this phase, see
    /// [`crate::randomization::models::Randomization`].
    #[serde(default)]
    pub serialized_randomization: String,
}

impl Phase {
    pub fn new(id: PhaseId, name: &str, format: PhaseFormat) -> Self {
        Phase {
            id,
            name: name.to_string(),
            format,
            serialized_randomization: String::new(),
        }
    }

    /// The token before the first space; this is the schedule-bearing part.
    pub fn short_name(&self) -> &str {
        self.name.split(' ').next().unwrap_or("")
    }

    /// Free-text label after the first space, empty when there is none.
    pub fn label(&self) -> &str {
        match self.name.split_once(' ') {
            Some((_, label)) => label.trim(),
            None => "",
        }
    }

    pub fn days(&self) -> i32 {
        self.schedule().0
    }

    pub fn hours(&self) -> i32 {
        self.schedule().1
    }

    pub fn minutes(&self) -> i32 {
        self.schedule().2
    }

    /// Total offset in minutes, the canonical ordering key.
    pub fn time_minutes(&self) -> i32 {
        let (days, hours, minutes) = self.schedule();
        (days * 24 + hours) * 60 + minutes
    }

    /// Parse (days, hours, minutes) from the short name.
    ///
    /// Recomputed on every call; parsing a short token is cheap enough that
    /// no cache invalidation contract is needed when the name changes.
    pub fn schedule(&self) -> (i32, i32, i32) {
        parse_schedule(self.short_name())
    }
}

/// Parse a short name into (days, hours, minutes).
///
/// Grammar: `d<days>[_<hours>h[<minutes>]]`. Missing day digits mean day 0,
/// a missing `_` segment means 00h00, and an `h` without trailing digits
/// means 0 minutes. Without a leading `d` the leading integer (if any) is
/// taken as the day and hours/minutes are 0.
fn parse_schedule(short_name: &str) -> (i32, i32, i32) {
    let short = short_name.trim();
    let Some(rest) = short.strip_prefix('d') else {
        return (parse_leading_int(short), 0, 0);
    };
    let (day_part, time_part) = match rest.split_once('_') {
        Some((day, time)) => (day, Some(time)),
        None => (rest, None),
    };
    let days = parse_leading_int(day_part);
    let (hours, minutes) = match time_part {
        Some(time) => match time.split_once('h') {
            Some((h, m)) => (parse_leading_int(h), parse_leading_int(m)),
            None => (parse_leading_int(time), 0),
        },
        None => (0, 0),
    };
    (days, hours, minutes)
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq for Phase {
    fn eq(&self, other: &Self) -> bool {
        self.schedule() == other.schedule() && self.name == other.name
    }
}

impl Eq for Phase {}

impl Ord for Phase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.schedule()
            .cmp(&other.schedule())
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Phase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
