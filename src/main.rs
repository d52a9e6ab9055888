//! スクレイピングを1回実行
//!
//! ```text
//! cargo run --release -- [OUTPUT_DIR]
//! RUST_LOG=fixture_scraper=debug cargo run
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use fixture_scraper::{ScrapeRequest, ScraperConfig, ScraperService};
use tower::Service;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ScraperConfig::default();
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output_dir.clone());

    let mut service = ScraperService::new(config);

    match service.call(ScrapeRequest::new(output_dir)).await {
        Ok(result) => {
            info!(
                "完了: 試合 {} 件 (消化 {} 件), ゴール {} 件, レポート取得失敗 {} 件",
                result.matches,
                result.played,
                result.goals,
                result.failed_reports.len()
            );
            for id in &result.failed_reports {
                info!("  未取得レポート: {}", id);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("スクレイピング失敗: {}", e);
            ExitCode::FAILURE
        }
    }
}
