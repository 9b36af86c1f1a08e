//! Interaction-driven auto-save
//!
//! There is no timer thread. Every interaction cycle calls [`AutoSave::tick`]
//! and a save happens only if the threshold has passed since the last
//! attempt, so an idle session may go longer than the threshold unsaved.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Default auto-save threshold in seconds
pub const DEFAULT_THRESHOLD_SECS: u64 = 30;

/// Result of one auto-save check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveOutcome {
    /// First cycle: the timer starts now
    Armed,
    /// Threshold not yet reached
    NotDue,
    /// Due, but no session is active
    Inactive,
    Saved(NaiveDateTime),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSave {
    threshold_secs: u64,
    #[serde(default, with = "optional_timestamp")]
    last_attempt: Option<NaiveDateTime>,
    #[serde(default, with = "optional_timestamp")]
    last_success: Option<NaiveDateTime>,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_SECS)
    }
}

impl AutoSave {
    pub fn new(threshold_secs: u64) -> Self {
        Self {
            threshold_secs,
            last_attempt: None,
            last_success: None,
        }
    }

    pub fn threshold_secs(&self) -> u64 {
        self.threshold_secs
    }

    /// Change the threshold, keeping the timer state
    pub fn set_threshold(&mut self, secs: u64) {
        self.threshold_secs = secs;
    }

    pub fn last_success(&self) -> Option<NaiveDateTime> {
        self.last_success
    }

    pub fn last_attempt(&self) -> Option<NaiveDateTime> {
        self.last_attempt
    }

    fn threshold(&self) -> TimeDelta {
        TimeDelta::seconds(i64::try_from(self.threshold_secs).unwrap_or(i64::MAX / 1000))
    }

    /// True when a tick at `now` would attempt a save
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        match self.last_attempt {
            Some(last) => now - last > self.threshold(),
            None => false,
        }
    }

    /// Run one interaction-cycle check
    ///
    /// Crossing the threshold resets the timer whatever the save outcome;
    /// the last-success marker moves only when `save` succeeds.
    pub fn tick<E, F>(&mut self, now: NaiveDateTime, active: bool, save: F) -> AutosaveOutcome
    where
        E: Display,
        F: FnOnce() -> Result<(), E>,
    {
        if self.last_attempt.is_none() {
            self.last_attempt = Some(now);
            return AutosaveOutcome::Armed;
        }
        if !self.is_due(now) {
            return AutosaveOutcome::NotDue;
        }
        if !active {
            return AutosaveOutcome::Inactive;
        }

        self.last_attempt = Some(now);
        match save() {
            Ok(()) => {
                self.last_success = Some(now);
                AutosaveOutcome::Saved(now)
            }
            Err(e) => AutosaveOutcome::Failed(e.to_string()),
        }
    }

    /// Note an explicit save made outside the scheduler
    pub fn record_success(&mut self, at: NaiveDateTime) {
        self.last_attempt = Some(at);
        self.last_success = Some(at);
    }
}

mod optional_timestamp {
    use crate::core::value::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => serializer.serialize_some(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
