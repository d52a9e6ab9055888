//! fbref 試合日程・ゴールスクレイパー
//!
//! - 大会の日程ページをヘッドレスChromiumで描画
//! - 日程テーブルを試合レコードに正規化
//! - 消化済み試合のマッチレポートからゴールを抽出
//! - 試合・ゴール・3種のゴール集計をCSVで出力
//!
//! # 使用例
//!
//! ```rust,ignore
//! use fixture_scraper::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ScraperService::new(ScraperConfig::default());
//!
//!     let request = ScrapeRequest::new("./data")
//!         .with_schedule_url("https://fbref.com/en/comps/656/schedule/");
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("goals: {}", result.goals);
//! }
//! ```
//!
//! # ブラウザなしでのパース
//!
//! ```rust,ignore
//! use fixture_scraper::fbref::{attach_report_links, normalize, parse_report_links, parse_schedule_table};
//!
//! let rows = parse_schedule_table(&html)?;
//! let mut matches = normalize(&rows);
//! attach_report_links(&mut matches, parse_report_links(&html, "https://fbref.com"));
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod fbref;
pub mod fetcher;
pub mod output;
pub mod retry;
pub mod service;
pub mod summary;
pub mod traits;

pub use browser::{ChromiumLauncher, ChromiumSession};
pub use config::ScraperConfig;
pub use error::ScraperError;
pub use fetcher::{Fetcher, FileDebugDump};
pub use retry::RetryPolicy;
pub use service::{run_pipeline, ScrapeRequest, ScrapeResult, ScraperService};
pub use traits::{BrowserSession, DebugSink, SessionFactory};
