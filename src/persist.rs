//! Actuator state kept across restarts as a flat JSON object of integers.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// `{tv, heater, lamp_floor, lamp_ceil, led_pwm}`. Missing or non-integer fields load as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tv: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub heater: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub lamp_floor: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub lamp_ceil: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub led_pwm: Option<i64>,
}

fn lenient<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_i64())
}

impl PersistedState {
    pub fn from_slice(src: &[u8]) -> Result<Self, PersistError> {
        Ok(serde_json::from_slice(src)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, PersistError> {
        Ok(serde_json::to_vec(self)?)
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<PersistedState, PersistError> {
    PersistedState::from_slice(&fs::read(path)?)
}

pub fn save(path: impl AsRef<Path>, state: &PersistedState) -> Result<(), PersistError> {
    fs::write(path, state.to_vec()?)?;

    Ok(())
}
