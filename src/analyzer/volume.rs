use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::AnalysisContext;

/// Sent/received tally for one calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    pub sent: usize,
    pub received: usize,
    pub total: usize,
}

/// The day with the most messages; `date` is `None` when nothing was sent or received
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusiestDay {
    pub date: Option<String>,
    pub total: usize,
    pub sent: usize,
    pub received: usize,
}

/// Message totals and the daily breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeStats {
    pub total_messages: usize,
    pub total_sent: usize,
    pub total_received: usize,
    pub busiest_day: BusiestDay,
    pub most_sent_in_day: usize,
    pub most_received_in_day: usize,
    pub active_days: usize,
    pub days_sent: usize,
    pub days_received: usize,
    pub daily_activity: BTreeMap<String, DayActivity>,
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> VolumeStats {
    let mut days: BTreeMap<NaiveDate, DayActivity> = BTreeMap::new();
    for message in &ctx.messages {
        let day = days.entry(message.timestamp.date_naive()).or_default();
        if message.is_from_me {
            day.sent += 1;
        } else {
            day.received += 1;
        }
        day.total += 1;
    }

    // Strict comparison over ascending dates keeps the earliest on ties
    let busiest_day = days
        .iter()
        .fold(None::<(&NaiveDate, &DayActivity)>, |best, (date, day)| match best {
            Some((_, top)) if top.total >= day.total => best,
            _ => Some((date, day)),
        })
        .map(|(date, day)| BusiestDay {
            date: Some(date.format("%Y-%m-%d").to_string()),
            total: day.total,
            sent: day.sent,
            received: day.received,
        })
        .unwrap_or_default();

    VolumeStats {
        total_messages: ctx.messages.len(),
        total_sent: ctx.sent.len(),
        total_received: ctx.received.len(),
        busiest_day,
        most_sent_in_day: days.values().map(|d| d.sent).max().unwrap_or(0),
        most_received_in_day: days.values().map(|d| d.received).max().unwrap_or(0),
        active_days: days.len(),
        days_sent: days.values().filter(|d| d.sent > 0).count(),
        days_received: days.values().filter(|d| d.received > 0).count(),
        daily_activity: days
            .into_iter()
            .map(|(date, day)| (date.format("%Y-%m-%d").to_string(), day))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{context_for, export, msg, one_on_one};
    use super::*;

    #[test]
    fn test_volume_counts_and_busiest_day() {
        let data = export(vec![one_on_one(
            "alice",
            vec![
                msg("a1", "2024-01-01T10:00:00Z", true, Some("hi")),
                msg("a2", "2024-01-01T10:01:00Z", false, Some("hey")),
                msg("a3", "2024-01-02T09:00:00Z", true, Some("again")),
                msg("a4", "2024-01-02T09:05:00Z", true, Some("and again")),
                msg("a5", "2023-12-31T23:00:00Z", true, Some("last year")),
            ],
        )]);
        let stats = context_for(&data, |ctx| compute(ctx));

        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.total_sent, 3);
        assert_eq!(stats.total_received, 1);
        assert_eq!(stats.active_days, 2);
        assert_eq!(stats.days_received, 1);
        assert_eq!(stats.most_sent_in_day, 2);
        // 2024-01-01 and 2024-01-02 both have two messages
        assert_eq!(stats.busiest_day.date.as_deref(), Some("2024-01-01"));
        assert_eq!(stats.busiest_day.total, 2);
        assert_eq!(stats.daily_activity["2024-01-02"].sent, 2);
    }

    #[test]
    fn test_volume_empty() {
        let data = export(Vec::new());
        let stats = context_for(&data, |ctx| compute(ctx));
        assert_eq!(stats, VolumeStats::default());
        assert_eq!(stats.busiest_day.date, None);
        assert_eq!(stats.busiest_day.total, 0);
    }
}
