//! # Platform Hook Boundary
//!
//! Thin adapter between the platform's lifecycle callbacks and
//! [`MatchLifecycleHooks`]. The platform names its events `afterCreate`,
//! `afterUpdate` and `afterDelete` and hands over raw JSON records; everything
//! past this module works with typed [`Match`] values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::constants::codes;
use crate::error::{FieldViolation, StandingsError, StandingsResult};
use crate::models::Match;
use crate::orchestration::MatchLifecycleHooks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEventType {
    #[serde(rename = "afterCreate")]
    AfterCreate,
    #[serde(rename = "afterUpdate")]
    AfterUpdate,
    #[serde(rename = "afterDelete")]
    AfterDelete,
}

impl fmt::Display for HookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterCreate => write!(f, "afterCreate"),
            Self::AfterUpdate => write!(f, "afterUpdate"),
            Self::AfterDelete => write!(f, "afterDelete"),
        }
    }
}

impl std::str::FromStr for HookEventType {
    type Err = StandingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "afterCreate" => Ok(Self::AfterCreate),
            "afterUpdate" => Ok(Self::AfterUpdate),
            "afterDelete" => Ok(Self::AfterDelete),
            other => Err(StandingsError::validation(
                format!("Unsupported hook event: {other}"),
                vec![FieldViolation::new(
                    "event_type",
                    codes::MISSING_REQUIRED_FIELD,
                    "expected afterCreate, afterUpdate or afterDelete",
                )],
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEvent {
    pub event_type: HookEventType,
    pub record: Match,
    pub previous: Option<Match>,
}

impl HookEvent {
    /// Build an event from the platform's raw payload
    pub fn from_json(event_type: &str, record: Value, previous: Option<Value>) -> StandingsResult<Self> {
        let event_type = event_type.parse()?;
        let record = parse_record("record", record)?;
        let previous = previous
            .filter(|value| !value.is_null())
            .map(|value| parse_record("previous", value))
            .transpose()?;
        Ok(Self {
            event_type,
            record,
            previous,
        })
    }
}

fn parse_record(field: &str, value: Value) -> StandingsResult<Match> {
    serde_json::from_value(value).map_err(|e| {
        StandingsError::validation(
            format!("Malformed match payload in {field}"),
            vec![FieldViolation::new(field, codes::MISSING_REQUIRED_FIELD, e.to_string())],
        )
    })
}

/// Route a platform event to the hook implementation; returns enqueued job ids
pub fn dispatch_hook(hooks: &dyn MatchLifecycleHooks, event: &HookEvent) -> Vec<Uuid> {
    match event.event_type {
        HookEventType::AfterCreate => hooks.after_create(&event.record),
        HookEventType::AfterUpdate => hooks.after_update(&event.record, event.previous.as_ref()),
        HookEventType::AfterDelete => hooks.after_delete(&event.record),
    }
}
