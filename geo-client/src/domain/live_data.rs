use serde::Deserialize;

/// Instantaneous power readings for a system.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveData {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub power: Vec<Power>,
}

/// Fields are optional per record; an incomplete record must not fail the
/// rest of the response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Power {
    /// Commodity type, e.g. `ELECTRICITY` or `GAS_ENERGY`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub watts: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub value_available: bool,
}
