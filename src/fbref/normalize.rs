//! 日程テーブルの行 → 試合レコード
//!
//! 壊れやすいヒューリスティックが2つある:
//!
//! * チーム名の前後に付く小文字2文字の国コード（`"Morocco ma"`, `"km Comoros"`）を
//!   文字列として除去する
//! * レポートリンクは位置で対応付ける（N番目のリンク = 行順でN番目の消化済み試合）。
//!   そのため [`attach_report_links`] の前にステータスを確定させ、両方を同じ
//!   日程ページから取ること。

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use super::types::{MatchRecord, MatchStatus, ScheduleRow};

pub const COL_DATE: &str = "Date";
pub const COL_TIME: &str = "Time";
pub const COL_HOME: &str = "Home";
pub const COL_AWAY: &str = "Away";
pub const COL_SCORE: &str = "Score";
pub const COL_VENUE: &str = "Venue";
pub const COL_REFEREE: &str = "Referee";

const SCORE_SEPARATOR: char = '–';

static CODE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}\s+").expect("Invalid prefix pattern"));
static CODE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[a-z]{2}$").expect("Invalid suffix pattern"));
static SHOOTOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\d+\s*\)").expect("Invalid shoot-out pattern"));

/// 先頭・末尾の小文字2文字コードを除去
///
/// `"xx Team Name yy"` → `"Team Name"`。単なる文字列処理なので、本来の名前が
/// そのような語で始まる/終わるチームは削られてしまう。
pub fn clean_team_name(raw: &str) -> String {
    let name = raw.trim();
    let name = CODE_PREFIX.replace(name, "");
    let name = CODE_SUFFIX.replace(&name, "");
    name.trim().to_string()
}

/// `"2–1"` を得点に分解
///
/// PK戦の括弧書き（`"(4) 1–1 (5)"`）は無視する。2つの数値にならないものは
/// 「スコアなし」であり 0–0 とは区別する。
pub fn parse_score(raw: &str) -> Option<(u32, u32)> {
    let stripped = SHOOTOUT.replace_all(raw, "");
    let (home, away) = stripped.split_once(SCORE_SEPARATOR)?;
    let home = home.trim().parse().ok()?;
    let away = away.trim().parse().ok()?;
    Some((home, away))
}

/// `{YYYY-MM-DD}_{home}_vs_{away}`（チーム名の空白は除去）
pub fn match_id(date: NaiveDate, home_team: &str, away_team: &str) -> String {
    format!(
        "{}_{}_vs_{}",
        date.format("%Y-%m-%d"),
        strip_whitespace(home_team),
        strip_whitespace(away_team)
    )
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// 1行分の試合レコード（未確定の枠は `None`）
pub fn normalize_row(row: &ScheduleRow) -> Option<MatchRecord> {
    let raw_date = row.get(COL_DATE)?;
    let home_raw = row.get(COL_HOME)?;
    let away_raw = row.get(COL_AWAY)?;

    let Some(date) = parse_date(raw_date) else {
        debug!("日付を解釈できない行を除外: '{}'", raw_date);
        return None;
    };

    let home_team = clean_team_name(home_raw);
    let away_team = clean_team_name(away_raw);
    if home_team.is_empty() || away_team.is_empty() {
        return None;
    }

    let score = row.get(COL_SCORE).unwrap_or_default().to_string();
    let goals = parse_score(&score);
    let status = if goals.is_some() {
        MatchStatus::Played
    } else {
        MatchStatus::Upcoming
    };

    Some(MatchRecord {
        match_id: match_id(date, &home_team, &away_team),
        date,
        time: row.get(COL_TIME).unwrap_or_default().to_string(),
        status,
        home_team,
        away_team,
        home_goals: goals.map(|(home, _)| home),
        away_goals: goals.map(|(_, away)| away),
        score,
        venue: row.get(COL_VENUE).unwrap_or_default().to_string(),
        referee: row.get(COL_REFEREE).unwrap_or_default().to_string(),
        report_link: None,
    })
}

/// 全行を正規化（行順を維持）
pub fn normalize(rows: &[ScheduleRow]) -> Vec<MatchRecord> {
    let matches: Vec<MatchRecord> = rows.iter().filter_map(normalize_row).collect();
    debug!(
        "日程 {} 行中 {} 行を正規化",
        matches.len(),
        rows.len()
    );
    matches
}

/// レポートリンクを消化済み試合に位置で対応付け
///
/// 前提: `matches` は日程の行順でステータス確定済み、`links` も同じ行順。
/// 未消化の試合にはリンクを付けない。付与した件数を返す。件数の不一致は
/// 並びがずれている可能性があるため警告を出す。
pub fn attach_report_links(matches: &mut [MatchRecord], links: Vec<String>) -> usize {
    let played = matches.iter().filter(|m| m.is_played()).count();
    if played != links.len() {
        warn!(
            "消化済み試合 ({}) とレポートリンク ({}) の件数が不一致（対応付けがずれている可能性）",
            played,
            links.len()
        );
    }

    let mut attached = 0;
    for (record, link) in matches
        .iter_mut()
        .filter(|m| m.is_played())
        .zip(links)
    {
        record.report_link = Some(link);
        attached += 1;
    }
    attached
}
