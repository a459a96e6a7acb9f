use geo_client::domain::{CurrentCost, LiveData, PeriodicData};
use time::OffsetDateTime;

use crate::registry::{ChargePeriod, Utility};

pub const COMMODITY_ELECTRICITY: &str = "ELECTRICITY";
pub const COMMODITY_GAS: &str = "GAS_ENERGY";

pub const DURATION_DAY: &str = "DAY";
pub const DURATION_WEEK: &str = "WEEK";
pub const DURATION_MONTH: &str = "MONTH";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveReading {
    pub utility: Utility,
    pub watts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub utility: Utility,
    pub watts: f64,
    pub reading_time: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEntry {
    pub utility: Utility,
    pub period: ChargePeriod,
    pub price_pence: f64,
}

/// All cost entries for one utility from a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBatch {
    pub utility: Utility,
    pub entries: Vec<CostEntry>,
    /// Shared by every entry; `None` when the API omitted it.
    pub timestamp: Option<OffsetDateTime>,
}

/// Map an API commodity type onto a [`Utility`]; `None` means unknown.
pub fn classify_commodity(commodity_type: &str) -> Option<Utility> {
    match commodity_type {
        COMMODITY_ELECTRICITY => Some(Utility::Electricity),
        COMMODITY_GAS => Some(Utility::Gas),
        _ => None,
    }
}

/// Map an API cost duration onto a [`ChargePeriod`]; `None` means unknown.
pub fn classify_duration(duration: &str) -> Option<ChargePeriod> {
    match duration {
        DURATION_DAY => Some(ChargePeriod::Day),
        DURATION_WEEK => Some(ChargePeriod::Week),
        DURATION_MONTH => Some(ChargePeriod::Month),
        _ => None,
    }
}

fn unix_time(secs: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs).ok()
}

/// Records with an unknown type or no value are dropped.
pub fn live_readings(data: &LiveData) -> Vec<LiveReading> {
    data.power
        .iter()
        .filter_map(|power| {
            let Some(utility) = power.kind.as_deref().and_then(classify_commodity) else {
                tracing::debug!(commodity_type = ?power.kind, "ignoring live reading");
                return None;
            };
            let Some(watts) = power.watts else {
                tracing::debug!(utility = utility.as_str(), "live reading has no value");
                return None;
            };
            Some(LiveReading { utility, watts })
        })
        .collect()
}

/// Readings whose value is not yet available this period, or that arrive
/// without a time or total, are skipped.
pub fn meter_readings(data: &PeriodicData) -> Vec<MeterReading> {
    let mut out = Vec::with_capacity(data.total_consumption_list.len());

    for consumption in &data.total_consumption_list {
        if !consumption.value_available {
            continue;
        }

        let Some(utility) = consumption.commodity_type.as_deref().and_then(classify_commodity) else {
            tracing::debug!(
                commodity_type = ?consumption.commodity_type,
                "ignoring meter reading"
            );
            continue;
        };

        let (Some(secs), Some(watts)) = (consumption.reading_time, consumption.total_consumption) else {
            tracing::debug!(utility = utility.as_str(), "meter reading is incomplete");
            continue;
        };

        let Some(reading_time) = unix_time(secs) else {
            tracing::warn!(
                utility = utility.as_str(),
                reading_time = secs,
                "meter reading time out of range"
            );
            continue;
        };

        out.push(MeterReading {
            utility,
            watts,
            reading_time,
        });
    }

    out
}

fn cost_batch(utility: Utility, costs: &[CurrentCost], timestamp: Option<i64>) -> CostBatch {
    let entries = costs
        .iter()
        .filter_map(|cost| {
            let Some(period) = cost.duration.as_deref().and_then(classify_duration) else {
                tracing::debug!(duration = ?cost.duration, "ignoring cost entry");
                return None;
            };
            let Some(price_pence) = cost.cost_amount else {
                tracing::debug!(utility = utility.as_str(), period = period.as_str(), "cost entry has no amount");
                return None;
            };
            Some(CostEntry {
                utility,
                period,
                price_pence,
            })
        })
        .collect();

    CostBatch {
        utility,
        entries,
        timestamp: timestamp.and_then(unix_time),
    }
}

/// One batch per utility: electricity first, then gas.
pub fn cost_batches(data: &PeriodicData) -> Vec<CostBatch> {
    vec![
        cost_batch(
            Utility::Electricity,
            &data.current_costs_elec,
            data.current_costs_elec_timestamp,
        ),
        cost_batch(Utility::Gas, &data.current_costs_gas, data.current_costs_gas_timestamp),
    ]
}
