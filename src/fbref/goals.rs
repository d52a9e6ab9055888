//! マッチレポートからのゴール抽出

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::schedule::cell_text;
use super::types::{GoalType, Minute, ReportGoal, UNKNOWN_TEAM};

static GOAL_ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.event_icon.goal").expect("Invalid goal icon selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("Invalid anchor selector"));
static MINUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"·\s*(\d+\+?\d*)[’']").expect("Invalid minute pattern"));

const SCORER_SEPARATOR: char = '·';

/// ゴールがどちらのチームのものか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

/// 直近の祖先 `div.event` の id で判定（`a` = ホーム、`b` = アウェイ）
fn side_of(container: &ElementRef<'_>) -> Option<Side> {
    let event = container
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div" && el.value().classes().any(|c| c == "event"))?;

    match event.value().id()?.to_ascii_lowercase().as_str() {
        "a" => Some(Side::Home),
        "b" => Some(Side::Away),
        _ => None,
    }
}

fn scorer_of(container: &ElementRef<'_>, text: &str) -> String {
    match container.select(&ANCHOR).next() {
        Some(a) => cell_text(&a),
        None => text
            .split(SCORER_SEPARATOR)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

fn minute_of(text: &str) -> Option<Minute> {
    MINUTE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Minute::parse(m.as_str()))
}

/// マッチレポート内のゴール（文書順）
///
/// `div.event_icon.goal` の親要素から得点者（リンクテキスト、なければ `·` の前）と
/// 得点時間を読む。どちらかが欠けた候補はノイズとして捨てる。
/// チーム判定できないゴールは `"Unknown"` として残す。
pub fn extract_goals(html: &str, home_team: &str, away_team: &str) -> Vec<ReportGoal> {
    let document = Html::parse_document(html);
    let mut goals = Vec::new();

    for icon in document.select(&GOAL_ICON) {
        let Some(container) = icon.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let text = cell_text(&container);

        let scorer = scorer_of(&container, &text);
        let Some(minute) = minute_of(&text) else {
            debug!("得点時間なしのゴールマーカーをスキップ: '{}'", text);
            continue;
        };
        if scorer.is_empty() {
            debug!("得点者なしのゴールマーカーをスキップ: '{}'", text);
            continue;
        }

        let team_scored = match side_of(&container) {
            Some(Side::Home) => home_team,
            Some(Side::Away) => away_team,
            None => UNKNOWN_TEAM,
        };

        goals.push(ReportGoal {
            team_scored: team_scored.to_string(),
            scorer,
            minute,
            goal_type: GoalType::Goal,
            raw: text,
        });
    }

    goals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbref::types::Stoppage;

    const HOME: &str = "Morocco";
    const AWAY: &str = "Comoros";

    #[test]
    fn test_home_and_unknown_attribution() {
        let html = r#"
            <div id="events_wrap">
              <div class="event" id="a">
                <div><div class="event_icon goal"></div>
                  <div><a href="/en/players/1/Brahim-Diaz">Brahim Díaz</a> · 55’</div></div>
              </div>
              <div class="event_block">
                <div><div class="event_icon goal"></div>
                  <div><a href="/en/players/2/Ayoub-El-Kaabi">Ayoub El Kaabi</a> · 74’</div></div>
              </div>
            </div>"#;

        let goals = extract_goals(html, HOME, AWAY);
        assert_eq!(goals.len(), 2);

        assert_eq!(goals[0].team_scored, HOME);
        assert_eq!(goals[0].scorer, "Brahim Díaz");
        assert_eq!(goals[0].minute, Minute::new(55));

        assert_eq!(goals[1].team_scored, UNKNOWN_TEAM);
        assert_eq!(goals[1].scorer, "Ayoub El Kaabi");
        assert_eq!(goals[1].minute, Minute::new(74));
        assert!(goals.iter().all(|g| g.goal_type == GoalType::Goal));
    }

    #[test]
    fn test_away_side_and_stoppage_time() {
        let html = r#"
            <div class="event" id="B">
              <div><div class="event_icon goal"></div>
                <div><a href="/en/players/3">Myziane Maolida</a> · 45+2'</div></div>
            </div>"#;

        let goals = extract_goals(html, HOME, AWAY);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].team_scored, AWAY);
        assert_eq!(goals[0].minute, Minute::with_stoppage(45, 2));
        assert_eq!(goals[0].minute.to_string(), "45+2");
    }

    #[test]
    fn test_truncated_stoppage_minute_is_kept() {
        let html = r#"
            <div class="event" id="a">
              <div><div class="event_icon goal"></div><a href="/p/5">Youssef En-Nesyri</a> · 90+’</div>
            </div>"#;

        let goals = extract_goals(html, HOME, AWAY);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].minute.stoppage, Some(Stoppage::Unspecified));
        assert_eq!(goals[0].minute.to_string(), "90+");
    }

    #[test]
    fn test_scorer_from_text_without_anchor() {
        let html = r#"
            <div class="event" id="a">
              <div><div class="event_icon goal"></div>Hakim Ziyech · 12’</div>
            </div>"#;

        let goals = extract_goals(html, HOME, AWAY);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].scorer, "Hakim Ziyech");
        assert_eq!(goals[0].raw, "Hakim Ziyech · 12’");
    }

    #[test]
    fn test_unrecognised_side_id_is_unknown() {
        let html = r#"
            <div class="event" id="c">
              <div><div class="event_icon goal"></div><a href="/p">Someone</a> · 3’</div>
            </div>
            <div class="event">
              <div><div class="event_icon goal"></div><a href="/p">Someone Else</a> · 8’</div>
            </div>"#;

        let goals = extract_goals(html, HOME, AWAY);
        assert_eq!(goals.len(), 2);
        assert!(goals.iter().all(|g| g.team_scored == UNKNOWN_TEAM));
    }

    #[test]
    fn test_partial_candidates_are_dropped() {
        let html = r#"
            <div class="event" id="a">
              <div><div class="event_icon goal"></div><a href="/p">No Minute</a></div>
              <div><div class="event_icon goal"></div> · 30’</div>
              <div><div class="event_icon substitute_in"></div><a href="/p">Sub</a> · 60’</div>
            </div>"#;

        assert!(extract_goals(html, HOME, AWAY).is_empty());
    }

    #[test]
    fn test_no_markers_no_goals() {
        assert!(extract_goals("<html><body></body></html>", HOME, AWAY).is_empty());
    }
}
