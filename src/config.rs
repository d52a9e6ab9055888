use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_SCHEDULE_URL: &str = "https://fbref.com/en/comps/656/schedule/";
pub const DEFAULT_SITE_ORIGIN: &str = "https://fbref.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub schedule_url: String,
    /// 相対リンクに付与するオリジン
    pub site_origin: String,
    pub output_dir: PathBuf,
    /// 出力ファイル名 `{prefix}_matches.csv` / `{prefix}_goals.csv`
    pub dataset_prefix: String,
    pub debug_html_path: PathBuf,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub user_agent: String,
    /// 1試行あたりのセレクタ待機上限
    pub max_wait: Duration,
    pub schedule_retry: RetryPolicy,
    pub report_retry: RetryPolicy,
    /// スクロール後の待機
    pub settle_delay: Duration,
    /// レポート取得の間隔
    pub request_delay: Duration,
    pub request_jitter: Duration,
    pub schedule_ready_selector: String,
    pub report_ready_selector: String,
    /// チャレンジページ判定用の文字列
    pub block_markers: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            output_dir: PathBuf::from("./data"),
            dataset_prefix: "afcon_2025".to_string(),
            debug_html_path: PathBuf::from("debug_page.html"),
            headless: true,
            chrome_executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_wait: Duration::from_secs(25),
            schedule_retry: RetryPolicy::new(2).with_jitter(Duration::from_secs(1)),
            report_retry: RetryPolicy::new(1).with_jitter(Duration::from_secs(1)),
            settle_delay: Duration::from_secs(1),
            request_delay: Duration::from_secs(1),
            request_jitter: Duration::from_millis(500),
            schedule_ready_selector: "table#sched_all".to_string(),
            report_ready_selector: "div.scorebox".to_string(),
            block_markers: vec![
                "Just a moment".to_string(),
                "cf-browser-verification".to_string(),
                "Cloudflare".to_string(),
            ],
        }
    }
}

impl ScraperConfig {
    pub fn new(schedule_url: impl Into<String>) -> Self {
        Self {
            schedule_url: schedule_url.into(),
            ..Default::default()
        }
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_dataset_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dataset_prefix = prefix.into();
        self
    }

    pub fn with_debug_html_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_html_path = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_schedule_retry(mut self, policy: RetryPolicy) -> Self {
        self.schedule_retry = policy;
        self
    }

    pub fn with_report_retry(mut self, policy: RetryPolicy) -> Self {
        self.report_retry = policy;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration, jitter: Duration) -> Self {
        self.request_delay = delay;
        self.request_jitter = jitter;
        self
    }

    pub fn matches_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_matches.csv", self.dataset_prefix))
    }

    pub fn goals_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_goals.csv", self.dataset_prefix))
    }

    pub fn teams_summary_path(&self) -> PathBuf {
        self.output_dir.join("teams_summary.csv")
    }

    pub fn players_summary_path(&self) -> PathBuf {
        self.output_dir.join("players_summary.csv")
    }

    pub fn matches_summary_path(&self) -> PathBuf {
        self.output_dir.join("matches_summary.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScraperConfig::new("https://fbref.com/en/comps/1/schedule/")
            .with_output_dir("/tmp/out")
            .with_dataset_prefix("wc_2026")
            .with_headless(false)
            .with_max_wait(Duration::from_secs(5))
            .with_report_retry(RetryPolicy::immediate(0));

        assert_eq!(config.schedule_url, "https://fbref.com/en/comps/1/schedule/");
        assert!(!config.headless);
        assert_eq!(config.max_wait, Duration::from_secs(5));
        assert_eq!(config.report_retry.max_retries, 0);
        assert_eq!(config.matches_path(), PathBuf::from("/tmp/out/wc_2026_matches.csv"));
        assert_eq!(config.goals_path(), PathBuf::from("/tmp/out/wc_2026_goals.csv"));
        assert_eq!(
            config.teams_summary_path(),
            PathBuf::from("/tmp/out/teams_summary.csv")
        );
    }

    #[test]
    fn test_default_retry_counts() {
        let config = ScraperConfig::default();
        assert_eq!(config.schedule_retry.max_retries, 2);
        assert_eq!(config.report_retry.max_retries, 1);
        assert_eq!(config.schedule_retry.jitter, Duration::from_secs(1));
        assert_eq!(config.report_retry.jitter, Duration::from_secs(1));
        assert_eq!(config.schedule_ready_selector, "table#sched_all");
    }
}
