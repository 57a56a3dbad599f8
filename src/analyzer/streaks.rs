use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::AnalysisContext;

/// Longest run of consecutive days with at least one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakStats {
    pub longest_streak_days: usize,
    pub longest_streak_contact: Option<String>,
    pub longest_streak_contact_id: Option<String>,
}

fn longest_run(dates: &BTreeSet<NaiveDate>) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in dates {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(date) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(date);
    }
    longest
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> StreakStats {
    let mut stats = StreakStats::default();
    for conversation in &ctx.conversations {
        let dates: BTreeSet<NaiveDate> = conversation
            .messages
            .iter()
            .filter(|m| m.is_in_year(ctx.year))
            .map(|m| m.timestamp.date_naive())
            .collect();
        let run = longest_run(&dates);
        if run > stats.longest_streak_days {
            stats.longest_streak_days = run;
            stats.longest_streak_contact = Some(conversation.label().to_string());
            stats.longest_streak_contact_id = Some(conversation.chat_identifier.clone());
        }
    }
    stats
}
