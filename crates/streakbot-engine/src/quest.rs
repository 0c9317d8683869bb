// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily quest selection and completion matching.

use std::collections::HashSet;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use streakbot_core::types::{DailyQuest, QUEST_TAG_CHAR_CLASS, QuestTemplate};

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("#({QUEST_TAG_CHAR_CLASS}+)")).expect("valid hashtag pattern")
});

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("{QUEST_TAG_CHAR_CLASS}+")).expect("valid word pattern")
});

/// Pick `count` templates for a chat's day.
///
/// Templates whose tag is in `recent` are avoided. When that leaves fewer
/// than `count`, every fresh template is taken and the rest is drawn from
/// the recent ones. The result lists fresh picks first and never repeats a
/// tag; it is shorter than `count` only when the catalog is.
pub fn select_quests<R: Rng + ?Sized>(
    catalog: &[QuestTemplate],
    recent: &HashSet<String>,
    count: usize,
    rng: &mut R,
) -> Vec<QuestTemplate> {
    let mut seen = HashSet::new();
    let unique: Vec<&QuestTemplate> = catalog
        .iter()
        .filter(|t| seen.insert(t.tag.as_str()))
        .collect();

    let (fresh, stale): (Vec<&QuestTemplate>, Vec<&QuestTemplate>) =
        unique.into_iter().partition(|t| !recent.contains(&t.tag));

    let mut picked: Vec<QuestTemplate> = fresh
        .choose_multiple(rng, count)
        .map(|t| (*t).clone())
        .collect();
    if picked.len() < count {
        let missing = count - picked.len();
        tracing::debug!(
            fresh = picked.len(),
            wanted = count,
            "not enough fresh quest templates, reusing recent ones"
        );
        picked.extend(stale.choose_multiple(rng, missing).map(|t| (*t).clone()));
    }
    picked
}

/// The result of checking one message against today's quests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestOutcome {
    /// No assigned quest is mentioned, or all mentioned ones are done.
    NoMatch,
    /// The first mentioned, not-yet-completed quest.
    Completed(DailyQuest),
    /// Every mentioned quest was already completed by the user today.
    AlreadyCompleted(String),
    /// A quest was mentioned at or after the cutoff.
    TooLate(DailyQuest),
}

/// Completion matching rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestRules {
    /// Local hour from which completions are refused.
    pub cutoff_hour: u32,
    /// Accept `run` as well as `#run`.
    pub match_bare_words: bool,
}

impl Default for QuestRules {
    fn default() -> Self {
        Self {
            cutoff_hour: 22,
            match_bare_words: false,
        }
    }
}

impl QuestRules {
    /// Tags the message mentions, lowercased.
    pub fn mentioned_tags(&self, text: &str) -> HashSet<String> {
        let pattern: &Regex = if self.match_bare_words { &*WORD } else { &*HASHTAG };
        pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1).or_else(|| c.get(0)))
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Whether the message could complete a quest at all.
    ///
    /// Lets the caller skip loading today's assignment for ordinary chatter.
    pub fn may_complete(&self, text: &str) -> bool {
        if self.match_bare_words {
            WORD.is_match(text)
        } else {
            HASHTAG.is_match(text)
        }
    }

    /// Match a message against the day's assignment.
    ///
    /// Quests are checked in listed order; the first one mentioned and not
    /// yet completed wins. `local_hour` is the message's hour in the bot's
    /// zone.
    pub fn try_complete(
        &self,
        text: &str,
        local_hour: u32,
        assigned: &[DailyQuest],
        already_completed: &[String],
    ) -> QuestOutcome {
        let mentioned = self.mentioned_tags(text);
        let mut done_mentioned = None;

        for quest in assigned {
            if !mentioned.contains(&quest.tag) {
                continue;
            }
            if already_completed.iter().any(|t| *t == quest.tag) {
                done_mentioned.get_or_insert_with(|| quest.tag.clone());
                continue;
            }
            if local_hour >= self.cutoff_hour {
                return QuestOutcome::TooLate(quest.clone());
            }
            return QuestOutcome::Completed(quest.clone());
        }

        match done_mentioned {
            Some(tag) => QuestOutcome::AlreadyCompleted(tag),
            None => QuestOutcome::NoMatch,
        }
    }
}
