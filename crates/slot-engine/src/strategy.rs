//! Weighting strategies that bias which slot the sampler picks from a chunk.
//!
//! Every active strategy contributes `round(w(i) * (multiplier - 1))` extra
//! weight to position `i` of a chunk; contributions from several strategies
//! add up. A weight of `0.0` therefore means "no bias".
//!
//! Strategy names use the form `heavy-<emphasis>` or `light-<emphasis>`,
//! plus the neutral `linear`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::SlotError;
use crate::slot::Slot;

/// What part of a chunk (or of the week/day) a strategy emphasises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Firsts,
    Lasts,
    Corners,
    Weekday(Weekday),
    Mornings,
    Afternoons,
    Evenings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    /// Uniform selection, no extra weight.
    Linear,
    Heavy(Emphasis),
    /// Parsed and listed, but contributes no weight.
    Light(Emphasis),
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

impl Strategy {
    /// Weight of position `index` in a chunk of `len` slots, in `[0, 1]`.
    ///
    /// Weekday and time-of-day emphases need `timezone`; without one they
    /// return `0.0`.
    pub fn weight(&self, index: usize, len: usize, slot: &Slot, timezone: Option<Tz>) -> f64 {
        let emphasis = match self {
            Strategy::Heavy(emphasis) => emphasis,
            Strategy::Linear | Strategy::Light(_) => return 0.0,
        };
        if len == 0 {
            return 0.0;
        }
        let len_f = len as f64;
        let i = index as f64;

        match emphasis {
            Emphasis::Firsts => (len_f - i) / len_f,
            Emphasis::Lasts => i / len_f,
            Emphasis::Corners => {
                let half = len_f / 2.0;
                (half - i).abs() / half
            }
            Emphasis::Weekday(day) => flag(
                timezone.is_some_and(|tz| slot.start.with_timezone(&tz).weekday() == *day),
            ),
            Emphasis::Mornings => local_hour_between(slot, timezone, 5, 12),
            // The 11..4 hour range is empty, so this never matches.
            Emphasis::Afternoons => local_hour_between(slot, timezone, 11, 4),
            Emphasis::Evenings => local_hour_between(slot, timezone, 3, 6),
        }
    }

    /// Every accepted strategy name, in canonical form.
    pub fn all_names() -> Vec<String> {
        let mut emphases = vec![Emphasis::Firsts, Emphasis::Lasts, Emphasis::Corners];
        emphases.extend(WEEKDAYS.iter().map(|d| Emphasis::Weekday(*d)));
        emphases.extend([Emphasis::Mornings, Emphasis::Afternoons, Emphasis::Evenings]);

        let mut names = vec![Strategy::Linear.to_string()];
        names.extend(emphases.iter().map(|e| Strategy::Heavy(*e).to_string()));
        names.extend(emphases.iter().map(|e| Strategy::Light(*e).to_string()));
        names
    }
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// 1.0 when the slot's local start hour is strictly between `after` and `before`.
fn local_hour_between(slot: &Slot, timezone: Option<Tz>, after: u32, before: u32) -> f64 {
    flag(timezone.is_some_and(|tz| {
        let hour = slot.start.with_timezone(&tz).hour();
        hour > after && hour < before
    }))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "sundays",
        Weekday::Mon => "mondays",
        Weekday::Tue => "tuesdays",
        Weekday::Wed => "wednesdays",
        Weekday::Thu => "thursdays",
        Weekday::Fri => "fridays",
        Weekday::Sat => "saturdays",
    }
}

impl fmt::Display for Emphasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Emphasis::Firsts => "firsts",
            Emphasis::Lasts => "lasts",
            Emphasis::Corners => "corners",
            Emphasis::Weekday(day) => weekday_name(*day),
            Emphasis::Mornings => "mornings",
            Emphasis::Afternoons => "afternoons",
            Emphasis::Evenings => "evenings",
        };
        f.write_str(name)
    }
}

impl FromStr for Emphasis {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firsts" => return Ok(Emphasis::Firsts),
            "lasts" => return Ok(Emphasis::Lasts),
            "corners" => return Ok(Emphasis::Corners),
            "mornings" => return Ok(Emphasis::Mornings),
            "afternoons" => return Ok(Emphasis::Afternoons),
            "evenings" => return Ok(Emphasis::Evenings),
            _ => {}
        }
        // Weekdays accept both "monday" and "mondays".
        WEEKDAYS
            .iter()
            .find(|d| {
                let plural = weekday_name(**d);
                s == plural || s == &plural[..plural.len() - 1]
            })
            .map(|d| Emphasis::Weekday(*d))
            .ok_or(())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Linear => f.write_str("linear"),
            Strategy::Heavy(e) => write!(f, "heavy-{}", e),
            Strategy::Light(e) => write!(f, "light-{}", e),
        }
    }
}

impl FromStr for Strategy {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "linear" {
            return Ok(Strategy::Linear);
        }
        let unknown = || SlotError::UnknownStrategy(s.to_string());
        let (kind, emphasis) = name.split_once('-').ok_or_else(unknown)?;
        let emphasis: Emphasis = emphasis.parse().map_err(|_| unknown())?;
        match kind {
            "heavy" => Ok(Strategy::Heavy(emphasis)),
            "light" => Ok(Strategy::Light(emphasis)),
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.to_string()
    }
}
