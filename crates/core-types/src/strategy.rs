use serde::Deserialize;
use toml::Value;

use crate::Result;

/// Names a strategy variant and carries its raw parameter table.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    // This will hold the `params = { ... }` table from the TOML
    #[serde(default = "empty_table")]
    pub params: Value,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self { name: name.into(), params }
    }

    /// Deserializes the parameter table into a concrete settings struct.
    pub fn parse_params<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(self.params.clone().try_into()?)
    }
}

fn empty_table() -> Value {
    Value::Table(toml::map::Map::new())
}
