use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcsStatus {
    None,
    Running,
    Paused,
    Terminated,
    Complete,
}

impl AcsStatus {
    pub const ALL: [AcsStatus; 5] = [
        AcsStatus::None,
        AcsStatus::Running,
        AcsStatus::Paused,
        AcsStatus::Terminated,
        AcsStatus::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AcsStatus::None => "none",
            AcsStatus::Running => "running",
            AcsStatus::Paused => "paused",
            AcsStatus::Terminated => "terminated",
            AcsStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for AcsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcsStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AcsStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::UnsupportedStatus(value.to_string()))
    }
}

/// Outcome reported back once a control has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcsControlResult {
    status: AcsStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_time: Option<u32>,
}

impl AcsControlResult {
    pub fn new(status: AcsStatus) -> Self {
        Self {
            status,
            extra_time: None,
        }
    }

    pub fn with_extra_time(mut self, extra_time: u32) -> Self {
        self.extra_time = Some(extra_time);
        self
    }

    pub fn status(&self) -> AcsStatus {
        self.status
    }

    pub fn set_status(&mut self, status: AcsStatus) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_status_str(&mut self, status: &str) -> Result<&mut Self, ValidationError> {
        self.status = status.parse()?;
        Ok(self)
    }

    pub fn extra_time(&self) -> Option<u32> {
        self.extra_time
    }

    pub fn set_extra_time(&mut self, extra_time: Option<u32>) -> &mut Self {
        self.extra_time = extra_time;
        self
    }
}

#[cfg(test)]
#[path = "tests/control_result_tests.rs"]
mod tests;
