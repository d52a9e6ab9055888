//! fbref.com のページ解析
//!
//! 日程テーブル → 行 → 試合レコード、マッチレポート → ゴール

mod goals;
mod normalize;
mod schedule;
mod types;

pub use goals::extract_goals;
pub use normalize::{attach_report_links, clean_team_name, match_id, normalize, parse_score};
pub use schedule::{parse_report_links, parse_schedule_table};
pub use types::{
    GoalEvent, GoalType, MatchGoalSummary, MatchRecord, MatchStatus, Minute, PlayerSummary,
    ReportGoal, ScheduleRow, Stoppage, TeamSummary, UNKNOWN_TEAM,
};
