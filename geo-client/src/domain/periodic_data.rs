use serde::Deserialize;

/// Cumulative meter readings and running costs for a system.
///
/// Timestamps are seconds since the Unix epoch as reported by the meter.
/// Per-record fields are optional so that one incomplete record (typically a
/// meter with no value yet) does not fail the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicData {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total_consumption_list: Vec<TotalConsumption>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub current_costs_elec: Vec<CurrentCost>,
    #[serde(default)]
    pub current_costs_elec_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub current_costs_gas: Vec<CurrentCost>,
    #[serde(default)]
    pub current_costs_gas_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalConsumption {
    #[serde(default)]
    pub commodity_type: Option<String>,
    #[serde(default)]
    pub reading_time: Option<i64>,
    #[serde(default)]
    pub total_consumption: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub value_available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCost {
    #[serde(default)]
    pub commodity_type: Option<String>,
    /// Accrual period, e.g. `DAY`, `WEEK` or `MONTH`.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub cost_amount: Option<f64>,
    #[serde(default)]
    pub energy_amount: Option<f64>,
}
