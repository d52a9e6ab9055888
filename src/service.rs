use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::time::sleep;
use tower::Service;
use tracing::{debug, error, info, warn};

use crate::browser::ChromiumLauncher;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::fbref::{
    attach_report_links, extract_goals, normalize, parse_report_links, parse_schedule_table,
    GoalEvent, MatchRecord,
};
use crate::fetcher::{Fetcher, FileDebugDump};
use crate::output::{write_table, DatasetPaths};
use crate::retry::jittered;
use crate::summary::{match_goal_summary, player_summary, team_summary};
use crate::traits::{DebugSink, SessionFactory};

/// 1回分の実行リクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub output_dir: PathBuf,
    pub schedule_url: Option<String>,
    pub dataset_prefix: Option<String>,
}

impl ScrapeRequest {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            schedule_url: None,
            dataset_prefix: None,
        }
    }

    pub fn with_schedule_url(mut self, url: impl Into<String>) -> Self {
        self.schedule_url = Some(url.into());
        self
    }

    pub fn with_dataset_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dataset_prefix = Some(prefix.into());
        self
    }

    /// `base` にリクエストの上書きを適用
    pub fn into_config(self, base: ScraperConfig) -> ScraperConfig {
        let mut config = base.with_output_dir(self.output_dir);
        if let Some(url) = self.schedule_url {
            config.schedule_url = url;
        }
        if let Some(prefix) = self.dataset_prefix {
            config.dataset_prefix = prefix;
        }
        config
    }
}

impl From<ScrapeRequest> for ScraperConfig {
    fn from(req: ScrapeRequest) -> Self {
        req.into_config(ScraperConfig::default())
    }
}

/// 実行結果
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub matches: usize,
    pub played: usize,
    pub with_report: usize,
    pub goals: usize,
    /// レポートを取得できなかった試合ID
    pub failed_reports: Vec<String>,
    pub paths: DatasetPaths,
}

/// 一括実行（日程 → 試合 → レポート → ゴール → 集計）
///
/// 日程の取得失敗・テーブルなしは中断。レポートの取得失敗はその試合のゴールを
/// 落とすだけ。
pub async fn run_pipeline<F, D>(
    config: &ScraperConfig,
    fetcher: &Fetcher<F, D>,
) -> Result<ScrapeResult, ScraperError>
where
    F: SessionFactory,
    D: DebugSink,
{
    fetcher.debug_sink().reset();
    std::fs::create_dir_all(&config.output_dir)?;
    let paths = DatasetPaths::from_config(config);

    info!("日程を取得中: {}", config.schedule_url);
    let html = fetcher
        .fetch(
            &config.schedule_url,
            &config.schedule_ready_selector,
            config.max_wait,
            &config.schedule_retry,
        )
        .await?;

    let rows = match parse_schedule_table(&html) {
        Ok(rows) => rows,
        Err(e) => {
            error!("日程テーブルが見つかりません {}: {}", config.schedule_url, e);
            fetcher.debug_sink().dump(&config.schedule_url, &html);
            return Err(e);
        }
    };
    info!("日程: {} 行", rows.len());

    let mut matches = normalize(&rows);
    let links = parse_report_links(&html, &config.site_origin);
    let attached = attach_report_links(&mut matches, links);
    let played = matches.iter().filter(|m| m.is_played()).count();
    info!(
        "試合: {} 件 (消化 {} 件, レポートリンク {} 件)",
        matches.len(),
        played,
        attached
    );

    write_table(&paths.matches, &matches)?;

    let (goals, failed_reports) = collect_goals(config, fetcher, &matches).await;

    write_table(&paths.goals, &goals)?;
    if goals.is_empty() {
        warn!("ゴールが0件のため集計は空になります");
    }

    write_table(&paths.teams_summary, &team_summary(&goals))?;
    write_table(&paths.players_summary, &player_summary(&goals))?;
    write_table(&paths.matches_summary, &match_goal_summary(&goals))?;

    info!(
        "実行完了: 試合 {} 件, ゴール {} 件, レポート失敗 {} 件",
        matches.len(),
        goals.len(),
        failed_reports.len()
    );

    Ok(ScrapeResult {
        matches: matches.len(),
        played,
        with_report: attached,
        goals: goals.len(),
        failed_reports,
        paths,
    })
}

/// レポートを日程順に1件ずつ取得
async fn collect_goals<F, D>(
    config: &ScraperConfig,
    fetcher: &Fetcher<F, D>,
    matches: &[MatchRecord],
) -> (Vec<GoalEvent>, Vec<String>)
where
    F: SessionFactory,
    D: DebugSink,
{
    let mut goals = Vec::new();
    let mut failed = Vec::new();

    let reports: Vec<(&MatchRecord, &str)> = matches
        .iter()
        .filter_map(|m| m.report_link.as_deref().map(|link| (m, link)))
        .collect();
    info!("マッチレポート {} 件からゴールを取得", reports.len());

    for (i, (record, link)) in reports.into_iter().enumerate() {
        if i > 0 {
            sleep(jittered(config.request_delay, config.request_jitter)).await;
        }

        let html = match fetcher
            .fetch(
                link,
                &config.report_ready_selector,
                config.max_wait,
                &config.report_retry,
            )
            .await
        {
            Ok(html) => html,
            Err(e) => {
                warn!("試合 {} のエラー ({}): {}", record.match_id, link, e);
                failed.push(record.match_id.clone());
                continue;
            }
        };

        let found = extract_goals(&html, &record.home_team, &record.away_team);
        if disagrees_with_score(record, found.len()) {
            debug!(
                "{}: スコア {} に対しゴール {} 件",
                record.match_id,
                record.score,
                found.len()
            );
            for goal in &found {
                debug!("  {} [{}]: {}", record.match_id, goal.team_scored, goal.raw);
            }
        }
        info!("{}: ゴール {} 件", record.match_id, found.len());

        goals.extend(
            found
                .into_iter()
                .map(|goal| GoalEvent::from_report(record, link, goal)),
        );
    }

    (goals, failed)
}

/// スコア上の得点合計と抽出したゴール数が食い違うか（スコアなしは対象外）
fn disagrees_with_score(record: &MatchRecord, goals: usize) -> bool {
    match (record.home_goals, record.away_goals) {
        (Some(home), Some(away)) => u64::from(home) + u64::from(away) != goals as u64,
        _ => false,
    }
}

/// tower::Service 実装（取得ごとに新しいブラウザを使う）
#[derive(Debug, Clone)]
pub struct ScraperService<F = ChromiumLauncher> {
    config: ScraperConfig,
    factory: F,
}

impl ScraperService<ChromiumLauncher> {
    pub fn new(config: ScraperConfig) -> Self {
        let factory = ChromiumLauncher::from_config(&config);
        Self { config, factory }
    }
}

impl<F> ScraperService<F> {
    pub fn with_factory(config: ScraperConfig, factory: F) -> Self {
        Self { config, factory }
    }
}

impl<F> Service<ScrapeRequest> for ScraperService<F>
where
    F: SessionFactory + Clone + 'static,
{
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("スクレイピングリクエスト受信: output_dir={:?}", req.output_dir);

        let config = req.into_config(self.config.clone());
        let factory = self.factory.clone();

        Box::pin(async move {
            let fetcher = Fetcher::new(factory, FileDebugDump::new(&config.debug_html_path))
                .with_block_markers(config.block_markers.clone())
                .with_settle_delay(config.settle_delay);

            run_pipeline(&config, &fetcher).await
        })
    }
}
