use serde::Serialize;

use super::AnalysisContext;
use crate::utils::{format_duration, median, round_to};

/// Median reply latency in each direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    /// Them -> you
    pub median_response_time_you_seconds: f64,
    pub median_response_time_you_formatted: String,
    /// You -> them
    pub median_response_time_them_seconds: f64,
    pub median_response_time_them_formatted: String,
    pub total_responses_you: usize,
    pub total_responses_them: usize,
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> ResponseTimeStats {
    let mut yours = Vec::new();
    let mut theirs = Vec::new();

    for conversation in &ctx.conversations {
        // Context-only predecessors may open a pair; the reply must be in-year
        let messages = conversation.sorted_messages();
        for pair in messages.windows(2) {
            let (previous, reply) = (pair[0], pair[1]);
            if previous.is_from_me == reply.is_from_me || !reply.is_in_year(ctx.year) {
                continue;
            }
            let gap = (reply.timestamp - previous.timestamp).num_milliseconds() as f64 / 1000.0;
            if reply.is_from_me {
                yours.push(gap);
            } else {
                theirs.push(gap);
            }
        }
    }

    let you = median(&yours).unwrap_or(0.0);
    let them = median(&theirs).unwrap_or(0.0);

    ResponseTimeStats {
        median_response_time_you_seconds: round_to(you, 2),
        median_response_time_you_formatted: format_duration(you),
        median_response_time_them_seconds: round_to(them, 2),
        median_response_time_them_formatted: format_duration(them),
        total_responses_you: yours.len(),
        total_responses_them: theirs.len(),
    }
}
