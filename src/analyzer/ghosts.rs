use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AnalysisContext;
use crate::ghost::{GhostConfig, GhostStats};
use crate::utils::round_to;

/// Ghosting summary for the statistics document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GhostSection {
    pub timeline_days: i64,
    pub ghosts: usize,
    pub ghostees: usize,
    pub ghost_ratio: Option<f64>,
    pub people_you_left_hanging: usize,
    pub people_who_left_you_hanging: usize,
}

impl From<&GhostStats> for GhostSection {
    fn from(stats: &GhostStats) -> Self {
        Self {
            timeline_days: stats.timeline.num_days(),
            ghosts: stats.ghosts(),
            ghostees: stats.ghostees(),
            ghost_ratio: stats.ghost_ratio().map(|r| round_to(r, 2)),
            people_you_left_hanging: stats.ghosts(),
            people_who_left_you_hanging: stats.ghostees(),
        }
    }
}

pub(crate) fn compute(
    ctx: &AnalysisContext<'_>,
    config: &GhostConfig,
    reference_time: Option<DateTime<Utc>>,
) -> GhostSection {
    let stats = GhostStats::compute(ctx.conversations.iter().copied(), ctx.year, config, reference_time);
    GhostSection::from(&stats)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{context_for, export, msg, one_on_one, ts};
    use super::*;

    #[test]
    fn test_section_counts() {
        let data = export(vec![
            one_on_one(
                "alice",
                vec![
                    msg("a1", "2024-03-01T10:00:00Z", true, Some("hey")),
                    msg("a2", "2024-03-01T10:05:00Z", false, Some("you around?")),
                ],
            ),
            one_on_one(
                "bob",
                vec![
                    msg("b1", "2024-03-01T10:00:00Z", false, Some("yo")),
                    msg("b2", "2024-03-01T10:01:00Z", true, Some("hello?")),
                ],
            ),
            one_on_one(
                "cat",
                vec![
                    msg("c1", "2024-03-01T10:00:00Z", false, Some("lunch")),
                    msg("c2", "2024-03-01T10:01:00Z", true, Some("ok?")),
                ],
            ),
        ]);
        let config = GhostConfig::from_days(30, false).unwrap();
        let section = context_for(&data, |ctx| compute(ctx, &config, Some(ts("2024-05-01T00:00:00Z"))));

        assert_eq!(section.timeline_days, 30);
        assert_eq!(section.ghosts, 1);
        assert_eq!(section.ghostees, 2);
        assert_eq!(section.ghost_ratio, Some(0.5));
        assert_eq!(section.people_you_left_hanging, 1);
        assert_eq!(section.people_who_left_you_hanging, 2);
    }

    #[test]
    fn test_ratio_null_without_ghostees() {
        let data = export(Vec::new());
        let config = GhostConfig::from_days(7, false).unwrap();
        let section = context_for(&data, |ctx| compute(ctx, &config, None));
        assert_eq!(section.ghost_ratio, None);
        assert!(serde_json::to_value(&section).unwrap()["ghost_ratio"].is_null());
    }
}
