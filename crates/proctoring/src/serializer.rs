use std::sync::Arc;

use anyhow::anyhow;
use lti_core::LtiError;
use serde_json::{Map, Value};

use crate::{
    factory::{AcsControlFactory, AcsControlResultFactory, ControlFactory, ControlResultFactory},
    model::{AcsControl, AcsControlResult},
};

fn parse_object(data: &str, context: &str) -> Result<Map<String, Value>, LtiError> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LtiError::wrap(
            context,
            anyhow!("expected a JSON object, found {other}"),
        )),
        Err(err) => Err(LtiError::wrap(context, err)),
    }
}

#[derive(Clone)]
pub struct AcsControlSerializer {
    factory: Arc<dyn ControlFactory>,
}

impl Default for AcsControlSerializer {
    fn default() -> Self {
        Self::new(Arc::new(AcsControlFactory))
    }
}

impl AcsControlSerializer {
    pub fn new(factory: Arc<dyn ControlFactory>) -> Self {
        Self { factory }
    }

    pub fn serialize(&self, control: &AcsControl) -> Result<String, LtiError> {
        serde_json::to_string(control)
            .map_err(|err| LtiError::wrap("Error during ACS control serialization", err))
    }

    pub fn deserialize(&self, data: &str) -> Result<AcsControl, LtiError> {
        let map = parse_object(data, "Error during ACS control deserialization")?;
        self.factory.create(&map)
    }
}

#[derive(Clone)]
pub struct AcsControlResultSerializer {
    factory: Arc<dyn ControlResultFactory>,
}

impl Default for AcsControlResultSerializer {
    fn default() -> Self {
        Self::new(Arc::new(AcsControlResultFactory))
    }
}

impl AcsControlResultSerializer {
    pub fn new(factory: Arc<dyn ControlResultFactory>) -> Self {
        Self { factory }
    }

    pub fn serialize(&self, result: &AcsControlResult) -> Result<String, LtiError> {
        serde_json::to_string(result)
            .map_err(|err| LtiError::wrap("Error during ACS control result serialization", err))
    }

    pub fn deserialize(&self, data: &str) -> Result<AcsControlResult, LtiError> {
        let map = parse_object(data, "Error during ACS control result deserialization")?;
        self.factory.create(&map)
    }
}

#[cfg(test)]
#[path = "tests/serializer_tests.rs"]
mod tests;
