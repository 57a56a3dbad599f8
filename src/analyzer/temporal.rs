use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use serde::Serialize;

use super::AnalysisContext;

/// When the user sends messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemporalStats {
    pub hour_distribution: BTreeMap<u32, usize>,
    /// 0 = Monday
    pub day_of_week_distribution: BTreeMap<u32, usize>,
    pub month_distribution: BTreeMap<u32, usize>,
    pub busiest_hour: (Option<u32>, usize),
    pub busiest_day_of_week: (Option<u32>, usize),
}

/// Largest bucket; the smallest key wins ties
fn peak(distribution: &BTreeMap<u32, usize>) -> (Option<u32>, usize) {
    distribution
        .iter()
        .fold((None, 0), |(key, top), (&k, &count)| {
            if key.is_none() || count > top {
                (Some(k), count)
            } else {
                (key, top)
            }
        })
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> TemporalStats {
    let mut hours = BTreeMap::new();
    let mut weekdays = BTreeMap::new();
    let mut months = BTreeMap::new();

    for message in &ctx.sent {
        let ts = message.timestamp;
        *hours.entry(ts.hour()).or_insert(0) += 1;
        *weekdays.entry(ts.weekday().num_days_from_monday()).or_insert(0) += 1;
        *months.entry(ts.month()).or_insert(0) += 1;
    }

    TemporalStats {
        busiest_hour: peak(&hours),
        busiest_day_of_week: peak(&weekdays),
        hour_distribution: hours,
        day_of_week_distribution: weekdays,
        month_distribution: months,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{context_for, export, msg, one_on_one};
    use super::*;

    #[test]
    fn test_distributions_use_sent_messages() {
        let data = export(vec![one_on_one(
            "bob",
            vec![
                // 2024-03-04 is a Monday
                msg("b1", "2024-03-04T08:15:00Z", true, Some("morning")),
                msg("b2", "2024-03-04T08:45:00Z", true, Some("still morning")),
                msg("b3", "2024-03-05T22:00:00Z", true, Some("night")),
                msg("b4", "2024-03-05T22:00:00Z", false, Some("ignored")),
            ],
        )]);
        let stats = context_for(&data, |ctx| compute(ctx));

        assert_eq!(stats.hour_distribution[&8], 2);
        assert_eq!(stats.hour_distribution[&22], 1);
        assert_eq!(stats.busiest_hour, (Some(8), 2));
        assert_eq!(stats.busiest_day_of_week, (Some(0), 2));
        assert_eq!(stats.month_distribution[&3], 3);
    }

    #[test]
    fn test_peak_ties_and_empty() {
        let mut distribution = BTreeMap::new();
        distribution.insert(14, 3);
        distribution.insert(9, 3);
        assert_eq!(peak(&distribution), (Some(9), 3));
        assert_eq!(peak(&BTreeMap::new()), (None, 0));

        let json = serde_json::to_value(TemporalStats::default()).unwrap();
        assert_eq!(json["busiest_hour"], serde_json::json!([null, 0]));
    }
}
