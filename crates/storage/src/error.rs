//! # ストレージ エラー型

/// ディスク操作のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// オブジェクトが存在しない
    #[error("オブジェクトが存在しません: {0}")]
    NotFound(String),
    /// キーがディスクのルート外を指している、または空
    #[error("不正なキー: {0}")]
    InvalidKey(String),
    /// ローカルファイルシステムのI/O失敗
    #[error("I/Oエラー: {0}")]
    Io(String),
    /// リモートバックエンドの失敗（接続失敗、非2xxレスポンス等）
    #[error("ストレージバックエンドエラー: {0}")]
    Backend(String),
}
