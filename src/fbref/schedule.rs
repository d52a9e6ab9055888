//! 日程ページの解析
//!
//! ヘッダー名をキーにした行と、行順のマッチレポートリンクを取り出す。
//! 両者の対応付けは [`super::normalize`] で行う。

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ScraperError;

use super::types::ScheduleRow;

static SCHEDULE_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table#sched_all").expect("Invalid schedule table selector")
});
static STATS_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.stats_table").expect("Invalid stats table selector"));
static HEADER_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead tr").expect("Invalid header row selector"));
static HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("Invalid header cell selector"));
static BODY_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("Invalid body row selector"));
static BODY_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("Invalid body cell selector"));
static STATS_ROW: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table.stats_table tbody tr").expect("Invalid stats row selector")
});
static REPORT_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"td[data-stat="match_report"] a"#).expect("Invalid report link selector")
});

/// テキストノードを半角スペース1つで連結
pub(crate) fn cell_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_filler_row(row: &ElementRef<'_>) -> bool {
    row.value()
        .classes()
        .any(|class| class == "thead" || class == "spacer")
}

/// ヘッダー名（重複は `xG`, `xG.1`, ... に）
fn header_labels(table: &ElementRef<'_>) -> Vec<String> {
    let Some(row) = table.select(&HEADER_ROW).last() else {
        return Vec::new();
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    row.select(&HEADER_CELL)
        .map(|th| {
            let label = cell_text(&th);
            let count = seen.entry(label.clone()).or_insert(0);
            let unique = if *count == 0 {
                label
            } else {
                format!("{}.{}", label, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

/// 日程テーブルをヘッダー名キーの行に変換
///
/// `table#sched_all` を優先し、なければ最初の `table.stats_table` を使う。
/// 繰り返しヘッダー行と区切り行は除外。行順は文書順。
pub fn parse_schedule_table(html: &str) -> Result<Vec<ScheduleRow>, ScraperError> {
    let document = Html::parse_document(html);

    let table = document
        .select(&SCHEDULE_TABLE)
        .next()
        .or_else(|| document.select(&STATS_TABLE).next())
        .ok_or_else(|| ScraperError::ElementNotFound("日程テーブル".into()))?;

    let headers = header_labels(&table);
    if headers.is_empty() {
        return Err(ScraperError::ElementNotFound(
            "日程テーブルのヘッダー行".into(),
        ));
    }

    let rows: Vec<ScheduleRow> = table
        .select(&BODY_ROW)
        .filter(|row| !is_filler_row(row))
        .map(|row| {
            headers
                .iter()
                .cloned()
                .zip(row.select(&BODY_CELL).map(|cell| cell_text(&cell)))
                .collect()
        })
        .collect();

    debug!("日程テーブル: {} 列, {} 行", headers.len(), rows.len());
    Ok(rows)
}

/// 行順のレポートリンク（マッチレポート列にリンクがある行のみ）
/// 相対パスには `origin` を付与。
pub fn parse_report_links(html: &str, origin: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let origin = origin.trim_end_matches('/');

    document
        .select(&STATS_ROW)
        .filter_map(|row| row.select(&REPORT_ANCHOR).next())
        .filter_map(|a| a.value().attr("href"))
        .map(|href| absolute_url(origin, href))
        .collect()
}

fn absolute_url(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}
