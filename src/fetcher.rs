//! レンダリング済みページの取得（リトライ・ソフトブロック検出・デバッグHTML出力）

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::ScraperError;
use crate::retry::RetryPolicy;
use crate::traits::{BrowserSession, DebugSink, SessionFactory};

const DEBUG_PREVIEW_CHARS: usize = 1200;
pub const CAPTURE_FAILED_PLACEHOLDER: &str = "FAILED TO CAPTURE HTML";

/// 失敗した試行のHTMLを固定ファイルに上書き保存
#[derive(Debug, Clone)]
pub struct FileDebugDump {
    path: PathBuf,
}

impl FileDebugDump {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, html: &str) {
        let body = if html.is_empty() { "EMPTY HTML" } else { html };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("デバッグ出力ディレクトリの作成に失敗: {}", e);
                    return;
                }
            }
        }
        if let Err(e) = std::fs::write(&self.path, body) {
            error!("{:?} の書き込みに失敗: {}", self.path, e);
        }
    }
}

impl DebugSink for FileDebugDump {
    fn dump(&self, url: &str, html: &str) {
        debug!("デバッグHTMLを保存: {} -> {:?}", url, self.path);
        self.write(html);
    }

    /// 失敗がなくてもファイルが存在するように初期化
    fn reset(&self) {
        self.write("DEBUG START\n");
    }
}

pub struct Fetcher<F, D> {
    factory: F,
    debug_sink: D,
    block_markers: Vec<String>,
    settle_delay: Duration,
}

impl<F, D> Fetcher<F, D>
where
    F: SessionFactory,
    D: DebugSink,
{
    pub fn new(factory: F, debug_sink: D) -> Self {
        Self {
            factory,
            debug_sink,
            block_markers: Vec::new(),
            settle_delay: Duration::from_secs(1),
        }
    }

    pub fn with_block_markers(mut self, markers: Vec<String>) -> Self {
        self.block_markers = markers;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn debug_sink(&self) -> &D {
        &self.debug_sink
    }

    /// `html` に含まれる最初のブロックマーカー
    pub fn detect_soft_block(&self, html: &str) -> Option<&str> {
        self.block_markers
            .iter()
            .map(String::as_str)
            .find(|marker| html.contains(marker))
    }

    /// `ready_selector` の出現を待ってから `url` のレンダリング済みHTMLを取得
    ///
    /// 試行ごとに新しいセッションを開き、次の試行の前に必ず閉じる。
    /// `policy.max_retries` 回のリトライを使い切ると最後の原因を持つ
    /// [`ScraperError::Fetch`] を返す。
    pub async fn fetch(
        &self,
        url: &str,
        ready_selector: &str,
        max_wait: Duration,
        policy: &RetryPolicy,
    ) -> Result<String, ScraperError> {
        let attempts = policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = policy.delay_before(attempt);
                if !delay.is_zero() {
                    debug!("リトライ前に {:?} 待機", delay);
                    sleep(delay).await;
                }
            }

            match self.attempt(url, ready_selector, max_wait).await {
                Ok(html) => {
                    info!(
                        "取得完了: {} ({} bytes, 試行 {}/{})",
                        url,
                        html.len(),
                        attempt + 1,
                        attempts
                    );
                    return Ok(html);
                }
                Err(e) => {
                    warn!("試行 {}/{} 失敗 ({}): {}", attempt + 1, attempts, url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ScraperError::Fetch {
            url: url.to_string(),
            attempts,
            source: Box::new(
                last_error.unwrap_or_else(|| ScraperError::Navigation("試行なし".into())),
            ),
        })
    }

    async fn attempt(
        &self,
        url: &str,
        ready_selector: &str,
        max_wait: Duration,
    ) -> Result<String, ScraperError> {
        // まだ何も描画されていないのでダンプ対象なし
        let mut session = self.factory.open().await?;

        let outcome = match session
            .render(url, ready_selector, max_wait, self.settle_delay)
            .await
        {
            Ok(html) => match self.detect_soft_block(&html) {
                Some(marker) => Err((
                    ScraperError::SoftBlock(format!("{} に '{}' を検出", url, marker)),
                    Some(html),
                )),
                None => Ok(html),
            },
            Err(e) => Err((e, None)),
        };

        let result = match outcome {
            Ok(html) => Ok(html),
            Err((e, rendered)) => {
                let html = match rendered {
                    Some(html) => html,
                    None => self.capture(&mut session).await,
                };
                self.dump(url, &html);
                Err(e)
            }
        };

        if let Err(e) = session.close().await {
            debug!("セッション終了に失敗 ({}): {}", url, e);
        }

        result
    }

    async fn capture<S: BrowserSession>(&self, session: &mut S) -> String {
        match session.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("デバッグ用HTMLを取得できません: {}", e);
                CAPTURE_FAILED_PLACEHOLDER.to_string()
            }
        }
    }

    fn dump(&self, url: &str, html: &str) {
        let preview: String = html.chars().take(DEBUG_PREVIEW_CHARS).collect();
        debug!("----- HTML DEBUG START -----\n{}\n----- HTML DEBUG END -----", preview);
        self.debug_sink.dump(url, html);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! スクリプト駆動のインメモリセッション

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::ScraperError;
    use crate::traits::{BrowserSession, DebugSink, SessionFactory};

    /// 1セッション分の挙動
    #[derive(Debug, Clone)]
    pub enum Script {
        Render(String),
        TimeOut(String),
        FailToOpen,
    }

    #[derive(Default)]
    pub struct Log {
        pub opened: usize,
        pub closed: usize,
    }

    #[derive(Clone, Default)]
    pub struct ScriptedFactory {
        scripts: Arc<Mutex<VecDeque<Script>>>,
        pub log: Arc<Mutex<Log>>,
    }

    impl ScriptedFactory {
        pub fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Arc::new(Mutex::new(scripts.into())),
                log: Arc::default(),
            }
        }

        pub fn opened(&self) -> usize {
            self.log.lock().unwrap().opened
        }

        pub fn closed(&self) -> usize {
            self.log.lock().unwrap().closed
        }
    }

    pub struct ScriptedSession {
        script: Script,
        log: Arc<Mutex<Log>>,
    }

    #[async_trait]
    impl SessionFactory for ScriptedFactory {
        type Session = ScriptedSession;

        async fn open(&self) -> Result<ScriptedSession, ScraperError> {
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Script::FailToOpen);
            if let Script::FailToOpen = script {
                return Err(ScraperError::BrowserInit("scripted launch failure".into()));
            }
            self.log.lock().unwrap().opened += 1;
            Ok(ScriptedSession {
                script,
                log: self.log.clone(),
            })
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedSession {
        async fn navigate(&mut self, _url: &str) -> Result<(), ScraperError> {
            Ok(())
        }

        async fn wait_for_selector(
            &mut self,
            selector: &str,
            _max_wait: Duration,
        ) -> Result<(), ScraperError> {
            match self.script {
                Script::TimeOut(_) => Err(ScraperError::Timeout(format!("'{}'", selector))),
                _ => Ok(()),
            }
        }

        async fn scroll_and_settle(&mut self, _settle: Duration) -> Result<(), ScraperError> {
            Ok(())
        }

        async fn content(&mut self) -> Result<String, ScraperError> {
            match &self.script {
                Script::Render(html) | Script::TimeOut(html) => Ok(html.clone()),
                Script::FailToOpen => Err(ScraperError::BrowserInit("not open".into())),
            }
        }

        async fn close(&mut self) -> Result<(), ScraperError> {
            self.log.lock().unwrap().closed += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub dumps: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        pub fn dumps(&self) -> Vec<(String, String)> {
            self.dumps.lock().unwrap().clone()
        }
    }

    impl DebugSink for RecordingSink {
        fn dump(&self, url: &str, html: &str) {
            self.dumps
                .lock()
                .unwrap()
                .push((url.to_string(), html.to_string()));
        }
    }
}
