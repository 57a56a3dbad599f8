use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::AnalysisContext;

const TOP_CONTACTS: usize = 10;

/// One row of a top-contacts list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactCount {
    pub name: String,
    pub count: usize,
}

/// The day with the most distinct contacts in one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDay {
    pub date: Option<String>,
    pub unique_contacts: usize,
}

/// Who the user talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactsStats {
    pub top_sent_to: Vec<ContactCount>,
    pub top_received_from: Vec<ContactCount>,
    pub unique_contacts_messaged: usize,
    pub unique_contacts_received_from: usize,
    pub social_butterfly_day: ContactDay,
    pub fan_club_day: ContactDay,
}

fn top(counts: Vec<ContactCount>) -> Vec<ContactCount> {
    let mut counts: Vec<ContactCount> = counts.into_iter().filter(|c| c.count > 0).collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts.truncate(TOP_CONTACTS);
    counts
}

fn widest_day(days: &BTreeMap<NaiveDate, BTreeSet<&str>>) -> ContactDay {
    let mut best: Option<(&NaiveDate, usize)> = None;
    for (date, contacts) in days {
        if best.map_or(true, |(_, n)| contacts.len() > n) {
            best = Some((date, contacts.len()));
        }
    }
    ContactDay {
        date: best.map(|(date, _)| date.format("%Y-%m-%d").to_string()),
        unique_contacts: best.map_or(0, |(_, n)| n),
    }
}

pub(crate) fn compute(ctx: &AnalysisContext<'_>) -> ContactsStats {
    let mut sent_counts = Vec::with_capacity(ctx.conversations.len());
    let mut received_counts = Vec::with_capacity(ctx.conversations.len());
    let mut sent_days: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    let mut received_days: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();

    for conversation in &ctx.conversations {
        let id = conversation.chat_identifier.as_str();
        let (mut sent, mut received) = (0, 0);
        for message in conversation.messages.iter().filter(|m| m.is_in_year(ctx.year)) {
            let date = message.timestamp.date_naive();
            if message.is_from_me {
                sent += 1;
                sent_days.entry(date).or_default().insert(id);
            } else {
                received += 1;
                received_days.entry(date).or_default().insert(id);
            }
        }
        let name = conversation.label().to_string();
        sent_counts.push(ContactCount {
            name: name.clone(),
            count: sent,
        });
        received_counts.push(ContactCount {
            name,
            count: received,
        });
    }

    let unique_contacts_messaged = sent_counts.iter().filter(|c| c.count > 0).count();
    let unique_contacts_received_from = received_counts.iter().filter(|c| c.count > 0).count();

    ContactsStats {
        top_sent_to: top(sent_counts),
        top_received_from: top(received_counts),
        unique_contacts_messaged,
        unique_contacts_received_from,
        social_butterfly_day: widest_day(&sent_days),
        fan_club_day: widest_day(&received_days),
    }
}
