//! Chromiumブラウザセッション
//!
//! セッションごとに使い捨てのプロファイルディレクトリでブラウザを起動する。
//! リトライ時に失敗した試行のCookieや状態は引き継がない。

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::retry::jittered;
use crate::traits::{BrowserSession, SessionFactory};

const SELECTOR_POLL_INTERVAL_MS: u64 = 500;
const CDP_REQUEST_TIMEOUT_SECS: u64 = 60;

const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// セッションごとに新しいChromiumを起動
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    chrome_executable: Option<PathBuf>,
    user_agent: String,
}

impl ChromiumLauncher {
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            chrome_executable: None,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn unique_profile_dir() -> PathBuf {
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        std::env::temp_dir().join(format!("fixture-scraper-{}", unique_id))
    }
}

#[async_trait]
impl SessionFactory for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn open(&self) -> Result<ChromiumSession, ScraperError> {
        let user_data_dir = Self::unique_profile_dir();
        debug!("ブラウザを起動中 (profile: {:?})", user_data_dir);

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(1920, 1080);

        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        if !self.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(CDP_REQUEST_TIMEOUT_SECS))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent));

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("ブラウザ設定: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {:?}", e);
                }
            }
        });

        let mut session = ChromiumSession {
            browser: Some(browser),
            page: None,
            handler: Some(handler_task),
            user_data_dir,
        };

        // ここから先はセッションがブラウザを所有する（ページ準備失敗時も後始末される）
        match session.open_page().await {
            Ok(page) => {
                session.page = Some(page);
                Ok(session)
            }
            Err(e) => {
                if let Err(close_err) = session.close().await {
                    debug!("初期化途中のセッション終了に失敗: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    user_data_dir: PathBuf,
}

impl ChromiumSession {
    async fn open_page(&self) -> Result<Page, ScraperError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("ブラウザは既に終了しています".into()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            HIDE_WEBDRIVER_SCRIPT,
        ))
        .await
        .map_err(|e| ScraperError::BrowserInit(format!("webdriver偽装スクリプト: {}", e)))?;

        Ok(page)
    }

    fn get_page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("ページが開かれていません".into()))
    }

    async fn scroll_to(&self, fraction: &str) -> Result<(), ScraperError> {
        let script = format!(
            "window.scrollTo(0, document.body.scrollHeight{});",
            fraction
        );
        self.get_page()?
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(())
    }
}

fn selector_probe(selector: &str) -> String {
    let escaped = selector.replace('\\', "\\\\").replace('\'', "\\'");
    format!("document.querySelector('{}') !== null", escaped)
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        info!("ページに移動: {}", url);
        self.get_page()?
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        max_wait: Duration,
    ) -> Result<(), ScraperError> {
        let page = self.get_page()?;
        let probe = selector_probe(selector);
        let start = Instant::now();
        let mut polls: u32 = 0;

        loop {
            let present = page
                .evaluate(probe.as_str())
                .await
                .map_err(|e| ScraperError::JavaScript(e.to_string()))?
                .into_value::<bool>()
                .unwrap_or(false);

            if present {
                info!("'{}' 検出 ({:?})", selector, start.elapsed());
                return Ok(());
            }

            if start.elapsed() >= max_wait {
                return Err(ScraperError::Timeout(format!(
                    "'{}' が {}秒以内に見つかりません",
                    selector,
                    max_wait.as_secs()
                )));
            }

            polls += 1;
            if polls % 10 == 0 {
                debug!("'{}' 待機中... ({:?})", selector, start.elapsed());
            }
            sleep(Duration::from_millis(SELECTOR_POLL_INTERVAL_MS)).await;
        }
    }

    async fn scroll_and_settle(&mut self, settle: Duration) -> Result<(), ScraperError> {
        self.scroll_to("/2").await?;
        sleep(jittered(settle, settle / 2)).await;
        self.scroll_to("").await?;
        sleep(jittered(settle, settle / 2)).await;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        self.get_page()?
            .content()
            .await
            .map_err(|e| ScraperError::JavaScript(format!("ページHTML取得: {}", e)))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        debug!("ブラウザを終了中...");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("ページのクローズに失敗: {}", e);
            }
        }

        let mut result = Ok(());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("ブラウザの終了に失敗: {}", e);
                result = Err(ScraperError::BrowserInit(format!("ブラウザ終了: {}", e)));
            }
            if let Err(e) = browser.wait().await {
                debug!("ブラウザ終了待機に失敗: {}", e);
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("プロファイル削除に失敗 {:?}: {}", self.user_data_dir, e);
        }

        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
