use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

/// 短命なブラウザセッション（取得の試行ごとに開き、必ず閉じる）
#[async_trait]
pub trait BrowserSession: Send {
    /// ページ遷移
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// `selector` の要素が現れるまで待機（`max_wait` 超過で `Timeout`）
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        max_wait: Duration,
    ) -> Result<(), ScraperError>;

    /// 遅延読み込みのためにスクロール
    async fn scroll_and_settle(&mut self, settle: Duration) -> Result<(), ScraperError>;

    /// 現在のHTML
    async fn content(&mut self) -> Result<String, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（navigate → wait_for_selector → scroll_and_settle → content）
    async fn render(
        &mut self,
        url: &str,
        ready_selector: &str,
        max_wait: Duration,
        settle: Duration,
    ) -> Result<String, ScraperError> {
        self.navigate(url).await?;
        self.wait_for_selector(ready_selector, max_wait).await?;
        self.scroll_and_settle(settle).await?;
        self.content().await
    }
}

/// 呼び出しごとに独立した新しいセッションを開く
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self) -> Result<Self::Session, ScraperError>;
}

/// 失敗した試行のHTMLの出力先（失敗してはならない）
pub trait DebugSink: Send + Sync {
    fn dump(&self, url: &str, html: &str);

    /// 実行開始時に1回呼ばれる
    fn reset(&self) {}
}
