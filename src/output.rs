//! CSVデータセット出力
//!
//! 全テーブルをBOM付きUTF-8で書き出す。レコードが0件でもヘッダー行は必ず出力する。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::ScraperError;
use crate::fbref::{GoalEvent, MatchGoalSummary, MatchRecord, PlayerSummary, TeamSummary};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 列構成が固定のレコード型
pub trait CsvTable: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl CsvTable for MatchRecord {
    const COLUMNS: &'static [&'static str] = &[
        "MatchID",
        "Date",
        "Time",
        "MatchStatus",
        "HomeTeam",
        "AwayTeam",
        "HomeGoals",
        "AwayGoals",
        "Score",
        "Venue",
        "Referee",
        "MatchReportLink",
    ];
}

impl CsvTable for GoalEvent {
    const COLUMNS: &'static [&'static str] = &[
        "MatchID",
        "Date",
        "HomeTeam",
        "AwayTeam",
        "TeamScored",
        "Scorer",
        "Minute",
        "GoalType",
        "ReportLink",
    ];
}

impl CsvTable for TeamSummary {
    const COLUMNS: &'static [&'static str] = &["TeamScored", "GoalsScored", "MatchesWithGoals"];
}

impl CsvTable for PlayerSummary {
    const COLUMNS: &'static [&'static str] = &["Scorer", "Goals", "MatchesScoredIn"];
}

impl CsvTable for MatchGoalSummary {
    const COLUMNS: &'static [&'static str] =
        &["MatchID", "Date", "HomeTeam", "AwayTeam", "TotalGoals"];
}

/// BOM → ヘッダー行 → `rows` の順に書き出し
pub fn write_table_to<W: Write, T: CsvTable>(mut out: W, rows: &[T]) -> Result<(), ScraperError> {
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(T::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// `path` をテーブルで置き換え（親ディレクトリは作成）
pub fn write_table<T: CsvTable>(path: &Path, rows: &[T]) -> Result<(), ScraperError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = BufWriter::new(File::create(path)?);
    write_table_to(file, rows)?;
    info!("{} 行を保存: {:?}", rows.len(), path);
    Ok(())
}

/// 1回の実行で出力する5ファイルのパス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub matches: PathBuf,
    pub goals: PathBuf,
    pub teams_summary: PathBuf,
    pub players_summary: PathBuf,
    pub matches_summary: PathBuf,
}

impl DatasetPaths {
    pub fn from_config(config: &crate::config::ScraperConfig) -> Self {
        Self {
            matches: config.matches_path(),
            goals: config.goals_path(),
            teams_summary: config.teams_summary_path(),
            players_summary: config.players_summary_path(),
            matches_summary: config.matches_summary_path(),
        }
    }
}
