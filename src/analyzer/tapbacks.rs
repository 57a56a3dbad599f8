use std::collections::BTreeMap;

use serde::Serialize;

use super::AnalysisContext;

/// Reactions given and received
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TapbackStats {
    pub total_tapbacks_given: usize,
    pub total_tapbacks_received: usize,
    pub favorite_tapback: (Option<String>, usize),
    pub most_received_tapback: (Option<String>, usize),
    pub tapback_distribution_given: BTreeMap<String, usize>,
    pub tapback_distribution_received: BTreeMap<String, usize>,
}

fn favorite(distribution: &BTreeMap<String, usize>) -> (Option<String>, usize) {
    let mut best: Option<(&String, usize)> = None;
    for (kind, &count) in distribution {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((kind, count));
        }
    }
    best.map_or((None, 0), |(kind, count)| (Some(kind.clone()), count))
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> TapbackStats {
    let mut given: BTreeMap<String, usize> = BTreeMap::new();
    let mut received: BTreeMap<String, usize> = BTreeMap::new();

    for tapback in ctx.messages.iter().flat_map(|m| m.tapbacks.iter()) {
        let bucket = if tapback.is_from_me() { &mut given } else { &mut received };
        *bucket.entry(tapback.kind.as_str().to_string()).or_insert(0) += 1;
    }

    TapbackStats {
        total_tapbacks_given: given.values().sum(),
        total_tapbacks_received: received.values().sum(),
        favorite_tapback: favorite(&given),
        most_received_tapback: favorite(&received),
        tapback_distribution_given: given,
        tapback_distribution_received: received,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{context_for, export, msg, one_on_one, with_tapbacks};
    use super::*;
    use crate::models::{TapbackKind, ME};

    #[test]
    fn test_given_and_received() {
        let data = export(vec![one_on_one(
            "alice",
            vec![
                with_tapbacks(
                    msg("1", "2024-06-01T10:00:00Z", false, Some("lol")),
                    &[(TapbackKind::Laugh, ME), (TapbackKind::Love, ME)],
                ),
                with_tapbacks(
                    msg("2", "2024-06-01T10:01:00Z", true, Some("right?")),
                    &[(TapbackKind::Laugh, "alice"), (TapbackKind::Laugh, ME)],
                ),
            ],
        )]);
        let stats = context_for(&data, |ctx| compute(ctx));

        assert_eq!(stats.total_tapbacks_given, 3);
        assert_eq!(stats.total_tapbacks_received, 1);
        assert_eq!(stats.favorite_tapback, (Some("laugh".to_string()), 2));
        assert_eq!(stats.most_received_tapback, (Some("laugh".to_string()), 1));
        assert_eq!(stats.tapback_distribution_given["love"], 1);
    }

    #[test]
    fn test_favorite_tie_takes_smallest_key() {
        let mut distribution = BTreeMap::new();
        distribution.insert("like".to_string(), 2);
        distribution.insert("emphasize".to_string(), 2);
        assert_eq!(favorite(&distribution), (Some("emphasize".to_string()), 2));
        assert_eq!(favorite(&BTreeMap::new()), (None, 0));
    }
}
