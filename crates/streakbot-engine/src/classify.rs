// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recognizes streak markers and bot commands in message text.

/// A bot command addressed to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/streaks` for the current cycle, `/streaks <year>` for an archive.
    Streaks(Option<i32>),
    /// `/quest`: today's assignment.
    Quest,
    /// `/questscore` for the current cycle, `/questscore <year>` for an archive.
    QuestScore(Option<i32>),
    Help,
    /// Any other `/word`. Never handled, never counted as activity.
    Unknown(String),
}

/// Parse a command-style text.
///
/// Returns `None` unless the text starts with `/`. A `@botname` suffix on
/// the command word is ignored; an unparsable year argument falls back to
/// the current cycle.
pub fn parse_command(text: &str) -> Option<Command> {
    let rest = text.trim_start().strip_prefix('/')?;
    let mut words = rest.split_whitespace();
    let head = words.next().unwrap_or_default();
    let name = head.split('@').next().unwrap_or_default().to_lowercase();
    let year = words.next().and_then(|arg| arg.parse::<i32>().ok());

    Some(match name.as_str() {
        "streaks" => Command::Streaks(year),
        "quest" | "quests" => Command::Quest,
        "questscore" => Command::QuestScore(year),
        "help" | "start" => Command::Help,
        _ => Command::Unknown(name),
    })
}

/// Whether `text` carries a streak marker.
///
/// A marker is a maximal run of one or two `+` characters with no `-`
/// directly before or after it. `+++` and `-+` are not markers, so diff
/// snippets and ratings like `+-` do not count.
pub fn has_streak_marker(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '+' {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i] == '+' {
            i += 1;
        }
        let run = i - start;
        let before = start.checked_sub(1).map(|j| chars[j]);
        let after = chars.get(i).copied();
        if run <= 2 && before != Some('-') && after != Some('-') {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_double_plus_are_markers() {
        assert!(has_streak_marker("+"));
        assert!(has_streak_marker("++"));
        assert!(has_streak_marker("morning run done +"));
        assert!(has_streak_marker("gym++ today"));
    }

    #[test]
    fn hyphen_adjacent_runs_are_not_markers() {
        assert!(!has_streak_marker("+-"));
        assert!(!has_streak_marker("-+"));
        assert!(!has_streak_marker("-++"));
        assert!(!has_streak_marker("++-"));
        assert!(!has_streak_marker("a -+- b"));
    }

    #[test]
    fn long_runs_are_not_markers() {
        assert!(!has_streak_marker("+++"));
        assert!(!has_streak_marker("c+++ is fun"));
    }

    #[test]
    fn any_valid_run_counts() {
        assert!(has_streak_marker("-+ then +"));
        assert!(has_streak_marker("+++ and ++"));
        assert!(has_streak_marker("learning c++ today"));
    }

    #[test]
    fn no_plus_no_marker() {
        assert!(!has_streak_marker(""));
        assert!(!has_streak_marker("just chatting"));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("/streaks"), Some(Command::Streaks(None)));
        assert_eq!(parse_command("/streaks 2025"), Some(Command::Streaks(Some(2025))));
        assert_eq!(parse_command("/quest"), Some(Command::Quest));
        assert_eq!(
            parse_command("/questscore 2024"),
            Some(Command::QuestScore(Some(2024)))
        );
        assert_eq!(parse_command("/help"), Some(Command::Help));
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(
            parse_command("/streaks@streak_bot"),
            Some(Command::Streaks(None))
        );
        assert_eq!(
            parse_command("/QuestScore@streak_bot 2025"),
            Some(Command::QuestScore(Some(2025)))
        );
    }

    #[test]
    fn bad_year_falls_back_to_current() {
        assert_eq!(parse_command("/streaks last"), Some(Command::Streaks(None)));
    }

    #[test]
    fn unknown_and_non_commands() {
        assert_eq!(
            parse_command("/dance"),
            Some(Command::Unknown("dance".to_string()))
        );
        assert_eq!(parse_command("hello /streaks"), None);
        assert_eq!(parse_command("+"), None);
    }
}
