use chrono::{DateTime, FixedOffset, NaiveDateTime};
use lti_core::{LtiError, LtiResourceLink};
use serde_json::{Map, Value};

use crate::{
    error::ValidationError,
    model::{AcsAction, AcsControl, AcsControlResult, AcsStatus},
};

pub trait ControlFactory: Send + Sync {
    fn create(&self, data: &Map<String, Value>) -> Result<AcsControl, LtiError>;
}

pub trait ControlResultFactory: Send + Sync {
    fn create(&self, data: &Map<String, Value>) -> Result<AcsControlResult, LtiError>;
}

/// Builds controls from untyped maps, checking mandatory fields in wire
/// order and failing on the first one missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcsControlFactory;

#[derive(Debug, Clone, Copy, Default)]
pub struct AcsControlResultFactory;

fn present<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|value| !value.is_null())
}

fn object<'a>(
    data: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    present(data, field)
        .ok_or(ValidationError::MissingField(field))?
        .as_object()
        .ok_or(ValidationError::InvalidField(field))
}

fn mandatory_string(
    data: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    match present(data, key) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        Some(_) => Err(ValidationError::InvalidField(field)),
    }
}

fn optional_string(
    data: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match present(data, key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ValidationError::InvalidField(field)),
    }
}

/// Integers, non-negative floats and numeric strings; fractions are truncated.
fn coerce_u32(value: &Value, field: &'static str) -> Result<u32, ValidationError> {
    let coerced = match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().and_then(truncate)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    };
    coerced
        .and_then(|number| u32::try_from(number).ok())
        .ok_or(ValidationError::InvalidField(field))
}

fn truncate(float: f64) -> Option<u64> {
    (float.is_finite() && float >= 0.0 && float <= u64::MAX as f64)
        .then(|| float.trunc() as u64)
}

fn coerce_f64(value: &Value, field: &'static str) -> Result<f64, ValidationError> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|float| float.is_finite())
    .ok_or(ValidationError::InvalidField(field))
}

fn optional_u32(
    data: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u32>, ValidationError> {
    present(data, field)
        .map(|value| coerce_u32(value, field))
        .transpose()
}

/// RFC 3339 first; a timestamp without offset is read as UTC.
fn parse_incident_time(value: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(time) => Ok(time),
        Err(rfc3339_err) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|_| rfc3339_err.into()),
    }
}

impl AcsControlFactory {
    fn build(&self, data: &Map<String, Value>) -> anyhow::Result<AcsControl> {
        let resource_link_data = object(data, "resource_link")?;
        let resource_link_identifier =
            mandatory_string(resource_link_data, "id", "resource_link.id")?;
        let mut resource_link = LtiResourceLink::new(resource_link_identifier);
        if let Some(title) = optional_string(resource_link_data, "title", "resource_link.title")? {
            resource_link = resource_link.with_title(title);
        }
        if let Some(description) =
            optional_string(resource_link_data, "description", "resource_link.description")?
        {
            resource_link = resource_link.with_text(description);
        }

        let user_data = object(data, "user")?;
        let user_identifier = mandatory_string(user_data, "sub", "user.sub")?;
        let issuer_identifier = mandatory_string(user_data, "iss", "user.iss")?;

        let action = present(data, "action")
            .and_then(Value::as_str)
            .and_then(|action| action.parse::<AcsAction>().ok())
            .ok_or(ValidationError::InvalidField("action"))?;

        let attempt_number = present(data, "attempt_number")
            .ok_or(ValidationError::MissingField("attempt_number"))
            .and_then(|value| coerce_u32(value, "attempt_number"))?;
        if attempt_number == 0 {
            return Err(ValidationError::InvalidField("attempt_number").into());
        }

        let incident_time = match present(data, "incident_time") {
            None => return Err(ValidationError::MissingField("incident_time").into()),
            Some(Value::String(value)) => parse_incident_time(value)?,
            Some(_) => return Err(ValidationError::InvalidField("incident_time").into()),
        };

        let mut control = AcsControl::new(
            resource_link,
            user_identifier,
            action,
            incident_time,
            attempt_number,
        );
        control
            .set_issuer_identifier(Some(issuer_identifier))
            .set_extra_time(optional_u32(data, "extra_time")?)
            .set_incident_severity(
                present(data, "incident_severity")
                    .map(|value| coerce_f64(value, "incident_severity"))
                    .transpose()?,
            )
            .set_reason_code(optional_string(data, "reason_code", "reason_code")?)
            .set_reason_message(optional_string(data, "reason_msg", "reason_msg")?);

        Ok(control)
    }
}

impl ControlFactory for AcsControlFactory {
    fn create(&self, data: &Map<String, Value>) -> Result<AcsControl, LtiError> {
        self.build(data)
            .map_err(|err| LtiError::wrap("Cannot create ACS control", err))
    }
}

impl AcsControlResultFactory {
    fn build(&self, data: &Map<String, Value>) -> Result<AcsControlResult, ValidationError> {
        let status = present(data, "status")
            .and_then(Value::as_str)
            .and_then(|status| status.parse::<AcsStatus>().ok())
            .ok_or(ValidationError::InvalidField("status"))?;

        let mut result = AcsControlResult::new(status);
        result.set_extra_time(optional_u32(data, "extra_time")?);
        Ok(result)
    }
}

impl ControlResultFactory for AcsControlResultFactory {
    fn create(&self, data: &Map<String, Value>) -> Result<AcsControlResult, LtiError> {
        self.build(data)
            .map_err(|err| LtiError::wrap("Cannot create ACS control result", err))
    }
}

#[cfg(test)]
#[path = "tests/factory_tests.rs"]
mod tests;
