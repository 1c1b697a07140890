//! # フィールド エラー型
//!
//! 書き込み経路（fill）のエラー。読み出し経路（resolve）のエラーは
//! 空の表示値に変換され、呼び出し元には返らない。

use sigfield_storage::StorageError;

/// フィールドエラー型。
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// ディスク・保存先パスの未設定、または未登録のディスク
    #[error("フィールド設定が不正: {0}")]
    Configuration(String),
    /// 署名画像のBase64デコードに失敗
    #[error("署名画像のBase64デコードに失敗: {0}")]
    Decode(#[from] base64::DecodeError),
    /// ディスクへの書き込みに失敗（レコードは変更されない）
    #[error("署名画像の書き込みに失敗: {0}")]
    StorageWrite(#[source] StorageError),
}
