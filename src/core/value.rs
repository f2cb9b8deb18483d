use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Typed sample payload carried next to its acquisition timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarKind {
    Float(f64),
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

/// One typed value plus the timestamp it was observed at.
///
/// Accessors convert between representations where a lossless or
/// conventional conversion exists; anything else is an
/// [`ChartError::InvalidData`] condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarValue {
    kind: ScalarKind,
    timestamp: DateTime<Utc>,
}

impl ScalarValue {
    #[must_use]
    pub fn float(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ScalarKind::Float(value),
            timestamp,
        }
    }

    #[must_use]
    pub fn int(value: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ScalarKind::Int(value),
            timestamp,
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ScalarKind::Text(value.into()),
            timestamp,
        }
    }

    #[must_use]
    pub fn time(value: DateTime<Utc>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ScalarKind::Time(value),
            timestamp,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ScalarKind {
        &self.kind
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn as_f64(&self) -> ChartResult<f64> {
        match &self.kind {
            ScalarKind::Float(value) => Ok(*value),
            ScalarKind::Int(value) => Ok(*value as f64),
            ScalarKind::Text(value) => value.trim().parse::<f64>().map_err(|_| {
                ChartError::InvalidData(format!("text value `{value}` is not numeric"))
            }),
            ScalarKind::Time(value) => Ok(datetime_to_unix_seconds(*value)),
        }
    }

    pub fn as_i64(&self) -> ChartResult<i64> {
        match &self.kind {
            ScalarKind::Float(value) => {
                if !value.is_finite() {
                    return Err(ChartError::InvalidData(
                        "non-finite float cannot convert to integer".to_owned(),
                    ));
                }
                Ok(value.round() as i64)
            }
            ScalarKind::Int(value) => Ok(*value),
            ScalarKind::Text(value) => value.trim().parse::<i64>().map_err(|_| {
                ChartError::InvalidData(format!("text value `{value}` is not an integer"))
            }),
            ScalarKind::Time(value) => Ok(value.timestamp()),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> String {
        match &self.kind {
            ScalarKind::Float(value) => format!("{value}"),
            ScalarKind::Int(value) => format!("{value}"),
            ScalarKind::Text(value) => value.clone(),
            ScalarKind::Time(value) => value.to_rfc3339(),
        }
    }

    pub fn as_time(&self) -> ChartResult<DateTime<Utc>> {
        match &self.kind {
            ScalarKind::Float(value) => unix_seconds_to_datetime(*value),
            ScalarKind::Int(value) => unix_seconds_to_datetime(*value as f64),
            ScalarKind::Text(value) => value
                .trim()
                .parse::<DateTime<Utc>>()
                .map_err(|_| ChartError::InvalidData(format!("text value `{value}` is not a date"))),
            ScalarKind::Time(value) => Ok(*value),
        }
    }
}

/// A named holder that may not have been assigned yet.
///
/// Reading an empty slot fails with [`ChartError::Uninitialized`], which is a
/// different condition from a NaN sample inside an assigned value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalarSlot {
    name: String,
    value: Option<ScalarValue>,
}

impl ScalarSlot {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.value.is_some()
    }

    pub fn assign(&mut self, value: ScalarValue) {
        self.value = Some(value);
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn get(&self) -> ChartResult<&ScalarValue> {
        self.value
            .as_ref()
            .ok_or_else(|| ChartError::Uninitialized(self.name.clone()))
    }
}

#[must_use]
pub fn datetime_to_unix_seconds(value: DateTime<Utc>) -> f64 {
    let seconds = value.timestamp() as f64;
    let subsec = f64::from(value.timestamp_subsec_millis()) / 1_000.0;
    seconds + subsec
}

pub fn unix_seconds_to_datetime(value: f64) -> ChartResult<DateTime<Utc>> {
    if !value.is_finite() {
        return Err(ChartError::InvalidData(
            "unix timestamp must be finite".to_owned(),
        ));
    }
    let seconds = value.floor() as i64;
    let nanos = ((value - value.floor()) * 1_000_000_000.0) as u32;
    Utc.timestamp_opt(seconds, nanos)
        .single()
        .ok_or_else(|| ChartError::InvalidData(format!("unix timestamp {value} is out of range")))
}
