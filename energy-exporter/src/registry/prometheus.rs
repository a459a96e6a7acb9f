use metrics::{counter, describe_counter, describe_gauge, gauge, with_local_recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use time::OffsetDateTime;

use super::{ChargePeriod, Clock, MetricRegistry, PollPass, SystemClock, Utility};

pub const LIVE_WATTS: &str = "live_watts";
pub const METER_READING: &str = "meter_reading";
pub const METER_READING_DELAY_SECONDS: &str = "meter_reading_delay_seconds";
pub const CURRENT_COST_PENCE: &str = "current_cost_pence";
pub const CURRENT_COST_DELAY_SECONDS: &str = "current_cost_delay_seconds";
pub const POLL_FAILURES_TOTAL: &str = "poll_failures_total";

/// [`MetricRegistry`] backed by a Prometheus recorder owned by this value.
///
/// The recorder is never installed as the global `metrics` recorder, so
/// several registries can coexist (one per test, for instance). Render the
/// current state through [`PrometheusRegistry::handle`].
pub struct PrometheusRegistry<C = SystemClock> {
    recorder: PrometheusRecorder,
    clock: C,
}

impl PrometheusRegistry<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PrometheusRegistry<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PrometheusRegistry<C> {
    pub fn with_clock(clock: C) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();

        with_local_recorder(&recorder, || {
            describe_gauge!(LIVE_WATTS, "Instantaneous power draw in watts.");
            describe_gauge!(METER_READING, "Cumulative meter reading as reported by the smart meter.");
            describe_gauge!(
                METER_READING_DELAY_SECONDS,
                "Seconds between the meter's own reading time and the last poll."
            );
            describe_gauge!(CURRENT_COST_PENCE, "Running cost in pence for the current charge period.");
            describe_gauge!(
                CURRENT_COST_DELAY_SECONDS,
                "Seconds between the cost data timestamp and the last poll."
            );
            describe_counter!(POLL_FAILURES_TOTAL, "Failed upstream fetches, by poll pass.");
        });

        Self { recorder, clock }
    }

    pub fn handle(&self) -> PrometheusHandle {
        self.recorder.handle()
    }

    fn seconds_since(&self, reading_time: OffsetDateTime) -> f64 {
        (self.clock.now() - reading_time).as_seconds_f64()
    }
}

impl<C: Clock> MetricRegistry for PrometheusRegistry<C> {
    fn set_live_usage(&self, utility: Utility, watts: f64) {
        with_local_recorder(&self.recorder, || {
            gauge!(LIVE_WATTS, "utility" => utility.as_str()).set(watts);
        });
    }

    fn set_meter_reading(&self, utility: Utility, watts: f64, reading_time: OffsetDateTime) {
        let delay = self.seconds_since(reading_time);
        with_local_recorder(&self.recorder, || {
            gauge!(METER_READING, "utility" => utility.as_str()).set(watts);
            gauge!(METER_READING_DELAY_SECONDS, "utility" => utility.as_str()).set(delay);
        });
    }

    fn set_cost(&self, utility: Utility, period: ChargePeriod, price_pence: f64) {
        with_local_recorder(&self.recorder, || {
            gauge!(
                CURRENT_COST_PENCE,
                "utility" => utility.as_str(),
                "duration" => period.as_str()
            )
            .set(price_pence);
        });
    }

    fn set_cost_delay(&self, utility: Utility, reading_time: OffsetDateTime) {
        let delay = self.seconds_since(reading_time);
        with_local_recorder(&self.recorder, || {
            gauge!(CURRENT_COST_DELAY_SECONDS, "utility" => utility.as_str()).set(delay);
        });
    }

    fn record_poll_failure(&self, pass: PollPass) {
        with_local_recorder(&self.recorder, || {
            counter!(POLL_FAILURES_TOTAL, "pass" => pass.as_str()).increment(1);
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::FixedClock;
    use time::macros::datetime;

    /// Find the sample for `name` with exactly `labels` in a text exposition.
    pub(crate) fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| {
                let (series, value) = line.rsplit_once(' ')?;
                let (series_name, series_labels) = match series.split_once('{') {
                    Some((n, rest)) => (n, rest.strip_suffix('}')?),
                    None => (series, ""),
                };
                if series_name != name {
                    return None;
                }

                let mut found: Vec<(&str, &str)> = series_labels
                    .split(',')
                    .filter(|pair| !pair.is_empty())
                    .filter_map(|pair| {
                        let (k, v) = pair.split_once('=')?;
                        Some((k, v.trim_matches('"')))
                    })
                    .collect();
                let mut wanted = labels.to_vec();
                found.sort_unstable();
                wanted.sort_unstable();

                if found == wanted {
                    value.parse().ok()
                } else {
                    None
                }
            })
    }

    fn registry() -> PrometheusRegistry<FixedClock> {
        PrometheusRegistry::with_clock(FixedClock(datetime!(2024-01-01 12:00:00 UTC)))
    }

    #[test]
    fn live_usage_is_labeled_by_utility() {
        let reg = registry();
        reg.set_live_usage(Utility::Electricity, 500.0);
        reg.set_live_usage(Utility::Gas, 1250.5);

        let out = reg.handle().render();
        assert_eq!(sample(&out, LIVE_WATTS, &[("utility", "electricity")]), Some(500.0));
        assert_eq!(sample(&out, LIVE_WATTS, &[("utility", "gas")]), Some(1250.5));
    }

    #[test]
    fn meter_reading_sets_value_and_staleness() {
        let reg = registry();
        reg.set_meter_reading(Utility::Gas, 98765.0, datetime!(2024-01-01 11:58:30 UTC));

        let out = reg.handle().render();
        assert_eq!(sample(&out, METER_READING, &[("utility", "gas")]), Some(98765.0));
        assert_eq!(
            sample(&out, METER_READING_DELAY_SECONDS, &[("utility", "gas")]),
            Some(90.0)
        );
        assert_eq!(sample(&out, METER_READING, &[("utility", "electricity")]), None);
    }

    #[test]
    fn future_reading_time_gives_negative_staleness() {
        let reg = registry();
        reg.set_meter_reading(Utility::Electricity, 1.0, datetime!(2024-01-01 12:00:30 UTC));

        let out = reg.handle().render();
        assert_eq!(
            sample(&out, METER_READING_DELAY_SECONDS, &[("utility", "electricity")]),
            Some(-30.0)
        );
    }

    #[test]
    fn cost_overwrites_instead_of_accumulating() {
        let reg = registry();
        reg.set_cost(Utility::Electricity, ChargePeriod::Day, 100.0);
        reg.set_cost(Utility::Electricity, ChargePeriod::Day, 150.0);
        reg.set_cost(Utility::Electricity, ChargePeriod::Month, 4200.0);

        let out = reg.handle().render();
        assert_eq!(
            sample(&out, CURRENT_COST_PENCE, &[("utility", "electricity"), ("duration", "day")]),
            Some(150.0)
        );
        assert_eq!(
            sample(&out, CURRENT_COST_PENCE, &[("utility", "electricity"), ("duration", "month")]),
            Some(4200.0)
        );
        assert_eq!(
            sample(&out, CURRENT_COST_PENCE, &[("utility", "electricity"), ("duration", "week")]),
            None
        );
    }

    #[test]
    fn cost_delay_is_per_utility() {
        let reg = registry();
        reg.set_cost_delay(Utility::Electricity, datetime!(2024-01-01 11:55:00 UTC));
        reg.set_cost_delay(Utility::Gas, datetime!(2024-01-01 11:30:00 UTC));

        let out = reg.handle().render();
        assert_eq!(
            sample(&out, CURRENT_COST_DELAY_SECONDS, &[("utility", "electricity")]),
            Some(300.0)
        );
        assert_eq!(
            sample(&out, CURRENT_COST_DELAY_SECONDS, &[("utility", "gas")]),
            Some(1800.0)
        );
    }

    #[test]
    fn poll_failures_accumulate_per_pass() {
        let reg = registry();
        reg.record_poll_failure(PollPass::Live);
        reg.record_poll_failure(PollPass::Live);
        reg.record_poll_failure(PollPass::Periodic);

        let out = reg.handle().render();
        assert_eq!(sample(&out, POLL_FAILURES_TOTAL, &[("pass", "live")]), Some(2.0));
        assert_eq!(sample(&out, POLL_FAILURES_TOTAL, &[("pass", "periodic")]), Some(1.0));
    }

    #[test]
    fn registries_do_not_share_state() {
        let a = registry();
        let b = registry();
        a.set_live_usage(Utility::Gas, 10.0);

        assert_eq!(sample(&b.handle().render(), LIVE_WATTS, &[("utility", "gas")]), None);
    }
}
