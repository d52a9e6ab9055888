//! 試合・ゴールのレコード型

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// チームを判定できないゴールの帰属先
pub const UNKNOWN_TEAM: &str = "Unknown";

/// 日程テーブルの1行（ヘッダー名 → セル）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleRow {
    cells: BTreeMap<String, String>,
}

impl ScheduleRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(header.into(), value.into());
    }

    /// セルのテキスト（列がない・空欄なら `None`）
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .get(header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ScheduleRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = ScheduleRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStatus {
    Played,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "MatchStatus")]
    pub status: MatchStatus,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    #[serde(rename = "HomeGoals")]
    pub home_goals: Option<u32>,
    #[serde(rename = "AwayGoals")]
    pub away_goals: Option<u32>,
    #[serde(rename = "Score")]
    pub score: String,
    #[serde(rename = "Venue")]
    pub venue: String,
    #[serde(rename = "Referee")]
    pub referee: String,
    #[serde(rename = "MatchReportLink")]
    pub report_link: Option<String>,
}

impl MatchRecord {
    pub fn is_played(&self) -> bool {
        self.status == MatchStatus::Played
    }
}

/// ロスタイム表記
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stoppage {
    Minutes(u32),
    /// `90+` のように分数が省略されたもの
    Unspecified,
}

/// 得点時間 (`67` / `45+2` / `90+`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Minute {
    pub regular: u32,
    pub stoppage: Option<Stoppage>,
}

impl Minute {
    pub fn new(regular: u32) -> Self {
        Self {
            regular,
            stoppage: None,
        }
    }

    pub fn with_stoppage(regular: u32, stoppage: u32) -> Self {
        Self {
            regular,
            stoppage: Some(Stoppage::Minutes(stoppage)),
        }
    }

    /// `67`、`45+2`、末尾が欠けた `45+` をパース
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (regular, stoppage) = match s.split_once('+') {
            Some((regular, extra)) => {
                let extra = extra.trim();
                let stoppage = if extra.is_empty() {
                    Stoppage::Unspecified
                } else {
                    Stoppage::Minutes(extra.parse().ok()?)
                };
                (regular, Some(stoppage))
            }
            None => (s, None),
        };
        Some(Self {
            regular: regular.trim().parse().ok()?,
            stoppage,
        })
    }
}

impl fmt::Display for Minute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stoppage {
            Some(Stoppage::Minutes(extra)) => write!(f, "{}+{}", self.regular, extra),
            Some(Stoppage::Unspecified) => write!(f, "{}+", self.regular),
            None => write!(f, "{}", self.regular),
        }
    }
}

impl Serialize for Minute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// ゴール種別（現状は通常ゴールのみ。PK・オウンゴールはここに追加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[non_exhaustive]
pub enum GoalType {
    #[default]
    Goal,
}

/// マッチレポートから読んだゴール（試合との紐付け前）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGoal {
    pub team_scored: String,
    pub scorer: String,
    pub minute: Minute,
    pub goal_type: GoalType,
    /// 読み取り元のテキスト（件数不一致時のログ用）
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalEvent {
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    #[serde(rename = "TeamScored")]
    pub team_scored: String,
    #[serde(rename = "Scorer")]
    pub scorer: String,
    #[serde(rename = "Minute")]
    pub minute: Minute,
    #[serde(rename = "GoalType")]
    pub goal_type: GoalType,
    #[serde(rename = "ReportLink")]
    pub report_link: String,
}

impl GoalEvent {
    pub fn from_report(record: &MatchRecord, link: &str, goal: ReportGoal) -> Self {
        Self {
            match_id: record.match_id.clone(),
            date: record.date,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            team_scored: goal.team_scored,
            scorer: goal.scorer,
            minute: goal.minute,
            goal_type: goal.goal_type,
            report_link: link.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    #[serde(rename = "TeamScored")]
    pub team: String,
    #[serde(rename = "GoalsScored")]
    pub goals_scored: usize,
    #[serde(rename = "MatchesWithGoals")]
    pub matches_with_goals: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    #[serde(rename = "Scorer")]
    pub scorer: String,
    #[serde(rename = "Goals")]
    pub goals: usize,
    #[serde(rename = "MatchesScoredIn")]
    pub matches_scored_in: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchGoalSummary {
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    #[serde(rename = "TotalGoals")]
    pub total_goals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_parse_and_display() {
        assert_eq!(Minute::parse("67"), Some(Minute::new(67)));
        assert_eq!(Minute::parse("45+2"), Some(Minute::with_stoppage(45, 2)));
        assert_eq!(Minute::parse("+3"), None);
        assert_eq!(Minute::parse("45+x"), None);
        assert_eq!(Minute::parse(""), None);

        assert_eq!(Minute::with_stoppage(45, 2).to_string(), "45+2");
        assert_eq!(Minute::new(9).to_string(), "9");
    }

    #[test]
    fn test_truncated_stoppage_keeps_plus() {
        let minute = Minute::parse("90+").unwrap();
        assert_eq!(minute.regular, 90);
        assert_eq!(minute.stoppage, Some(Stoppage::Unspecified));
        assert_ne!(minute, Minute::new(90));
        assert_eq!(minute.to_string(), "90+");
    }

    #[test]
    fn test_schedule_row_blank_cells_are_missing() {
        let row: ScheduleRow = [("Date", "2025-12-21"), ("Home", "  "), ("Away", "Comoros km")]
            .into_iter()
            .collect();

        assert_eq!(row.get("Date"), Some("2025-12-21"));
        assert_eq!(row.get("Home"), None);
        assert_eq!(row.get("Venue"), None);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_goal_type_defaults_to_goal() {
        assert_eq!(GoalType::default(), GoalType::Goal);
    }
}
