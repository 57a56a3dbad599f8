use serde::Serialize;

use super::AnalysisContext;
use crate::models::Conversation;
use crate::utils::percentage;

/// Share of in-year messages by chat kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupRatio {
    pub group_percentage: f64,
    pub one_on_one_percentage: f64,
}

/// The busiest thread overall
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveThread {
    pub name: Option<String>,
    pub message_count: usize,
    pub is_group: bool,
}

/// The busiest group chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveGroupChat {
    pub name: String,
    pub message_count: usize,
}

/// Group versus one-on-one breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationStats {
    pub total_conversations: usize,
    pub group_chats: usize,
    pub one_on_one_chats: usize,
    pub group_vs_1on1_ratio: GroupRatio,
    pub most_active_thread: ActiveThread,
    pub most_active_group_chat: Option<ActiveGroupChat>,
}

/// First conversation with the highest count
fn busiest<'a, I>(counted: I) -> Option<(&'a Conversation, usize)>
where
    I: IntoIterator<Item = (&'a Conversation, usize)>,
{
    counted
        .into_iter()
        .fold(None, |best, (conversation, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((conversation, count)),
        })
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> ConversationStats {
    let counted: Vec<(&Conversation, usize)> = ctx
        .conversations
        .iter()
        .map(|c| (*c, c.messages.iter().filter(|m| m.is_in_year(ctx.year)).count()))
        .collect();

    let group_chats = counted.iter().filter(|(c, _)| c.is_group_chat).count();
    let group_messages: usize = counted
        .iter()
        .filter(|(c, _)| c.is_group_chat)
        .map(|(_, n)| n)
        .sum();
    let total: usize = counted.iter().map(|(_, n)| n).sum();
    let one_on_one_messages = total - group_messages;

    let most_active_thread = busiest(counted.iter().copied())
        .map(|(c, n)| ActiveThread {
            name: Some(c.label().to_string()),
            message_count: n,
            is_group: c.is_group_chat,
        })
        .unwrap_or_default();

    let most_active_group_chat = busiest(counted.iter().copied().filter(|(c, _)| c.is_group_chat))
        .map(|(c, n)| ActiveGroupChat {
            name: c.label().to_string(),
            message_count: n,
        });

    ConversationStats {
        total_conversations: counted.len(),
        group_chats,
        one_on_one_chats: counted.len() - group_chats,
        group_vs_1on1_ratio: GroupRatio {
            group_percentage: percentage(group_messages as f64, total as f64),
            one_on_one_percentage: percentage(one_on_one_messages as f64, total as f64),
        },
        most_active_thread,
        most_active_group_chat,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{context_for, export, group, msg, one_on_one};
    use super::*;

    #[test]
    fn test_group_breakdown() {
        let data = export(vec![
            one_on_one(
                "alice",
                vec![
                    msg("a1", "2024-02-01T10:00:00Z", true, Some("x")),
                    msg("a2", "2024-02-01T10:01:00Z", false, Some("y")),
                    msg("a3", "2024-02-01T10:02:00Z", true, Some("z")),
                ],
            ),
            group(
                "chat42",
                "Climbing",
                vec![msg("g1", "2024-02-01T11:00:00Z", true, Some("send"))],
            ),
        ]);
        let stats = context_for(&data, |ctx| compute(ctx));

        assert_eq!(stats.total_conversations, 2);
        assert_eq!(stats.group_chats, 1);
        assert_eq!(stats.one_on_one_chats, 1);
        assert!((stats.group_vs_1on1_ratio.group_percentage - 25.0).abs() < 1e-9);
        assert_eq!(stats.most_active_thread.name.as_deref(), Some("alice"));
        assert_eq!(stats.most_active_thread.message_count, 3);
        assert_eq!(
            stats.most_active_group_chat,
            Some(ActiveGroupChat {
                name: "Climbing".to_string(),
                message_count: 1
            })
        );
    }

    #[test]
    fn test_no_conversations() {
        let data = export(Vec::new());
        let stats = context_for(&data, |ctx| compute(ctx));
        assert_eq!(stats, ConversationStats::default());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["most_active_group_chat"].is_null());
    }
}
