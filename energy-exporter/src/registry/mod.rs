use time::OffsetDateTime;

pub mod prometheus;

pub use prometheus::PrometheusRegistry;

/// Metered commodity a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Utility {
    Electricity,
    Gas,
}

impl Utility {
    pub fn as_str(self) -> &'static str {
        match self {
            Utility::Electricity => "electricity",
            Utility::Gas => "gas",
        }
    }
}

/// Accrual period of a cost figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargePeriod {
    Day,
    Week,
    Month,
}

impl ChargePeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            ChargePeriod::Day => "day",
            ChargePeriod::Week => "week",
            ChargePeriod::Month => "month",
        }
    }
}

/// Which half of a poll cycle a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollPass {
    Live,
    Periodic,
}

impl PollPass {
    pub fn as_str(self) -> &'static str {
        match self {
            PollPass::Live => "live",
            PollPass::Periodic => "periodic",
        }
    }
}

/// Write-only projection target for poll results.
///
/// Every setter overwrites the value for its label set; nothing accumulates
/// except the failure counter.
pub trait MetricRegistry: Send + Sync {
    fn set_live_usage(&self, utility: Utility, watts: f64);

    /// Sets the cumulative reading and its staleness (now - `reading_time`).
    /// A reading time in the future yields a negative staleness.
    fn set_meter_reading(&self, utility: Utility, watts: f64, reading_time: OffsetDateTime);

    fn set_cost(&self, utility: Utility, period: ChargePeriod, price_pence: f64);

    /// One staleness value per utility, shared by all of its charge periods.
    fn set_cost_delay(&self, utility: Utility, reading_time: OffsetDateTime);

    fn record_poll_failure(&self, pass: PollPass);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
