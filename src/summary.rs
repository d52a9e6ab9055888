//! ゴール集計
//!
//! 1回分のゴールイベントから作る純粋な集計。順序付きマップで集約するため
//! 入力順に依存しない。件数が同じ行はキーの昇順になる。

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::fbref::{GoalEvent, MatchGoalSummary, PlayerSummary, TeamSummary};

/// キーごとのゴール数と得点試合数（ゴール数の降順）
fn tally<'a, K, F>(goals: &'a [GoalEvent], key: F) -> Vec<(K, usize, usize)>
where
    K: Ord,
    F: Fn(&'a GoalEvent) -> K,
{
    let mut groups: BTreeMap<K, (usize, HashSet<&'a str>)> = BTreeMap::new();
    for goal in goals {
        let entry = groups.entry(key(goal)).or_default();
        entry.0 += 1;
        entry.1.insert(goal.match_id.as_str());
    }

    let mut rows: Vec<(K, usize, usize)> = groups
        .into_iter()
        .map(|(k, (count, matches))| (k, count, matches.len()))
        .collect();
    // 安定ソート: 同数はキー順のまま
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows
}

pub fn team_summary(goals: &[GoalEvent]) -> Vec<TeamSummary> {
    tally(goals, |g| g.team_scored.as_str())
        .into_iter()
        .map(|(team, goals_scored, matches_with_goals)| TeamSummary {
            team: team.to_string(),
            goals_scored,
            matches_with_goals,
        })
        .collect()
}

pub fn player_summary(goals: &[GoalEvent]) -> Vec<PlayerSummary> {
    tally(goals, |g| g.scorer.as_str())
        .into_iter()
        .map(|(scorer, goals, matches_scored_in)| PlayerSummary {
            scorer: scorer.to_string(),
            goals,
            matches_scored_in,
        })
        .collect()
}

/// 試合ごとのゴール数（試合ID順）
pub fn match_goal_summary(goals: &[GoalEvent]) -> Vec<MatchGoalSummary> {
    let mut groups: BTreeMap<(&str, NaiveDate, &str, &str), usize> = BTreeMap::new();
    for goal in goals {
        *groups
            .entry((
                goal.match_id.as_str(),
                goal.date,
                goal.home_team.as_str(),
                goal.away_team.as_str(),
            ))
            .or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((match_id, date, home, away), total_goals)| MatchGoalSummary {
            match_id: match_id.to_string(),
            date,
            home_team: home.to_string(),
            away_team: away.to_string(),
            total_goals,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbref::{GoalType, Minute};

    fn goal(match_id: &str, team: &str, scorer: &str, minute: u32) -> GoalEvent {
        let (home, away) = match_id.split_once("_vs_").unwrap();
        let (day, home) = home.split_once('_').unwrap();
        GoalEvent {
            match_id: match_id.to_string(),
            date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            team_scored: team.to_string(),
            scorer: scorer.to_string(),
            minute: Minute::new(minute),
            goal_type: GoalType::Goal,
            report_link: format!("https://fbref.com/en/matches/{}", match_id),
        }
    }

    fn sample() -> Vec<GoalEvent> {
        const M1: &str = "2025-12-21_Morocco_vs_Comoros";
        const M2: &str = "2025-12-26_Morocco_vs_Mali";
        const M3: &str = "2025-12-22_Egypt_vs_Zimbabwe";
        vec![
            goal(M1, "Morocco", "Brahim Díaz", 55),
            goal(M1, "Morocco", "Ayoub El Kaabi", 74),
            goal(M2, "Morocco", "Brahim Díaz", 10),
            goal(M2, "Mali", "Lassine Sinayoko", 80),
            goal(M3, "Egypt", "Mohamed Salah", 90),
            goal(M3, "Zimbabwe", "Prince Dube", 20),
            goal(M3, "Unknown", "Omar Marmoush", 64),
        ]
    }

    #[test]
    fn test_team_summary_counts() {
        let teams = team_summary(&sample());

        assert_eq!(
            teams[0],
            TeamSummary {
                team: "Morocco".into(),
                goals_scored: 3,
                matches_with_goals: 2,
            }
        );
        let names: Vec<&str> = teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(names, vec!["Morocco", "Egypt", "Mali", "Unknown", "Zimbabwe"]);
        assert!(teams[1..].iter().all(|t| t.goals_scored == 1));
    }

    #[test]
    fn test_player_summary_counts() {
        let players = player_summary(&sample());

        assert_eq!(players[0].scorer, "Brahim Díaz");
        assert_eq!(players[0].goals, 2);
        assert_eq!(players[0].matches_scored_in, 2);
        assert_eq!(players.len(), 6);
    }

    #[test]
    fn test_match_goal_summary_counts() {
        let matches = match_goal_summary(&sample());

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].match_id, "2025-12-21_Morocco_vs_Comoros");
        assert_eq!(matches[0].total_goals, 2);
        assert_eq!(matches[1].match_id, "2025-12-22_Egypt_vs_Zimbabwe");
        assert_eq!(matches[1].total_goals, 3);
        assert_eq!(matches[1].home_team, "Egypt");
        assert_eq!(matches[1].away_team, "Zimbabwe");
        assert_eq!(matches[2].total_goals, 2);
    }

    #[test]
    fn test_aggregation_ignores_input_order() {
        let goals = sample();
        let mut reversed = goals.clone();
        reversed.reverse();
        let mut rotated = goals.clone();
        rotated.rotate_left(3);

        for permuted in [reversed, rotated] {
            assert_eq!(team_summary(&goals), team_summary(&permuted));
            assert_eq!(player_summary(&goals), player_summary(&permuted));
            assert_eq!(match_goal_summary(&goals), match_goal_summary(&permuted));
        }
    }

    #[test]
    fn test_empty_input_gives_empty_tables() {
        assert!(team_summary(&[]).is_empty());
        assert!(player_summary(&[]).is_empty());
        assert!(match_goal_summary(&[]).is_empty());
    }
}
