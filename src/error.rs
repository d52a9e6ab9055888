use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("JavaScriptエラー: {0}")]
    JavaScript(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    /// 描画は成功したがボット対策のチャレンジページ
    #[error("ソフトブロック検出: {0}")]
    SoftBlock(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    /// 全試行が失敗（`source` は最後の原因）
    #[error("取得失敗: {url} ({attempts} 回試行): {source}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("CSV出力エラー: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_keeps_last_cause() {
        let err = ScraperError::Fetch {
            url: "https://fbref.com/x".into(),
            attempts: 3,
            source: Box::new(ScraperError::SoftBlock("Just a moment".into())),
        };

        let msg = err.to_string();
        assert!(msg.contains("https://fbref.com/x"));
        assert!(msg.contains("3 回試行"));
        assert!(msg.contains("Just a moment"));

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("ソフトブロック検出: Just a moment"));
    }
}
