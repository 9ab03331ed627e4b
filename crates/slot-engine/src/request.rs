//! The JSON-facing request and its validated form.
//!
//! [`SlotRequest`] mirrors the configuration object callers send (camelCase
//! keys, time-of-day arrays, strategy names). [`SlotRequest::into_query`]
//! checks it once and produces a [`SlotQuery`] whose fields are already
//! typed, so later stages never have to re-validate.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::generator::slot_step;
use crate::sampler::{SamplingConfig, DEFAULT_WEIGHT_MULTIPLIER, MAX_WEIGHT_MULTIPLIER};
use crate::slot::{DailyWindow, TimeOfDay, TimeRange, WeekdaySet};
use crate::source::IdentitySelector;
use crate::strategy::Strategy;
use crate::window::WindowConstraints;

pub const DEFAULT_SLOT_DURATION_MINUTES: i64 = 30;

/// Daily window as written in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRequest {
    pub timezone: String,
    /// `[hour, minute?, second?]`
    pub from: Vec<u32>,
    /// `[hour, minute?, second?]`
    pub to: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default = "default_slot_duration")]
    pub slot_duration: i64,
    /// Allowed weekdays, 0=Sunday..6=Saturday. All days when omitted.
    #[serde(default)]
    pub days: Option<Vec<u8>>,
    #[serde(default)]
    pub daily: Option<DailyRequest>,
    /// Minutes added around each slot before the busy containment test.
    #[serde(default)]
    pub padding: i64,
    #[serde(default, alias = "slots")]
    pub count: Option<usize>,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
    #[serde(default = "default_weight_multiplier")]
    pub weight_multiplier: f64,
    #[serde(default = "default_calendar_ids")]
    pub calendar_ids: Vec<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

fn default_slot_duration() -> i64 {
    DEFAULT_SLOT_DURATION_MINUTES
}

fn default_strategies() -> Vec<Strategy> {
    vec![Strategy::Linear]
}

fn default_weight_multiplier() -> f64 {
    DEFAULT_WEIGHT_MULTIPLIER
}

fn default_calendar_ids() -> Vec<String> {
    IdentitySelector::default().calendar_ids
}

/// A validated request, ready for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotQuery {
    pub range: TimeRange,
    pub slot_duration_minutes: i64,
    pub window: WindowConstraints,
    pub padding_minutes: i64,
    pub sampling: SamplingConfig,
    pub identity: IdentitySelector,
}

impl SlotQuery {
    /// A query over `range` with every other setting at its default.
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            window: WindowConstraints::default(),
            padding_minutes: 0,
            sampling: SamplingConfig::default(),
            identity: IdentitySelector::default(),
        }
    }

    /// Timezone of the daily window, if one is configured.
    pub fn timezone(&self) -> Option<Tz> {
        self.window.daily.map(|d| d.timezone)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SlotError::InvalidTimezone(name.to_string()))
}

impl SlotRequest {
    /// Validate the request.
    ///
    /// # Errors
    /// `InvalidDuration`, `InvalidRange`, `InvalidPadding`,
    /// `InvalidWeightMultiplier`, `InvalidTimezone`, `InvalidTimeOfDay` or
    /// `InvalidWeekday`, whichever is found first. Unknown strategy names are
    /// already rejected during deserialization.
    pub fn into_query(self) -> Result<SlotQuery> {
        let step = slot_step(self.slot_duration)?;
        let range = TimeRange::new(self.from, self.to)?;
        if range.from.checked_add_signed(step).is_none() {
            return Err(SlotError::InvalidDuration(self.slot_duration));
        }

        let padding = (self.padding >= 0)
            .then(|| chrono::Duration::try_minutes(self.padding))
            .flatten();
        let padded_fits = padding.is_some_and(|p| {
            range.from.checked_sub_signed(p).is_some() && range.to.checked_add_signed(p).is_some()
        });
        if !padded_fits {
            return Err(SlotError::InvalidPadding(self.padding));
        }

        let multiplier = self.weight_multiplier;
        if !(0.0..=MAX_WEIGHT_MULTIPLIER).contains(&multiplier) {
            return Err(SlotError::InvalidWeightMultiplier(multiplier));
        }

        let days = match &self.days {
            Some(days) => WeekdaySet::from_numbers(days)?,
            None => WeekdaySet::all(),
        };

        let daily = match &self.daily {
            Some(daily) => Some(DailyWindow {
                timezone: parse_timezone(&daily.timezone)?,
                from: TimeOfDay::from_parts(&daily.from)?,
                to: TimeOfDay::from_parts(&daily.to)?,
            }),
            None => None,
        };

        if let Some(tz) = &self.time_zone {
            parse_timezone(tz)?;
        }

        Ok(SlotQuery {
            range,
            slot_duration_minutes: self.slot_duration,
            window: WindowConstraints { days, daily },
            padding_minutes: self.padding,
            sampling: SamplingConfig {
                count: self.count,
                strategies: self.strategies,
                weight_multiplier: self.weight_multiplier,
            },
            identity: IdentitySelector {
                calendar_ids: self.calendar_ids,
                time_zone: self.time_zone,
            },
        })
    }
}
