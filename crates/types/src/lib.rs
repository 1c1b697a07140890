//! # sigfield 共有型定義
//!
//! 署名フィールドの入出力で受け渡される値をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - Base64: 画像バイナリ（Standard、パディングあり）
//! - Data URI: `data:image/<拡張子>;base64,<ペイロード>`

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// クライアントが送信する署名画像のData URIプレフィックス。
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// URLから拡張子を推定できなかった場合に使用する拡張子。
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Base64エンジン（Standard）
pub fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

// ---------------------------------------------------------------------------
// Data URI
// ---------------------------------------------------------------------------

/// Data URIのパースエラー。
#[derive(Debug, thiserror::Error)]
pub enum DataUriError {
    /// `data:image/` で始まらない、または `;base64,` を含まない
    #[error("画像のData URIではありません")]
    NotImageDataUri,
    /// ペイロードのBase64デコードに失敗
    #[error("Base64デコードに失敗: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// 表示用の画像Data URI。
///
/// 保存はされず、resolveのたびにストレージ上のファイルから再計算される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// MIMEサブタイプとして使う拡張子（例: "png", "jpg"）
    pub extension: String,
    /// 画像の生バイト列
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// 拡張子とバイト列からData URIを構築する。
    pub fn new(extension: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            extension: extension.into(),
            bytes,
        }
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data:image/{};base64,{}",
            self.extension,
            b64().encode(&self.bytes)
        )
    }
}

impl FromStr for DataUri {
    type Err = DataUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("data:image/")
            .ok_or(DataUriError::NotImageDataUri)?;
        let (extension, payload) = rest
            .split_once(";base64,")
            .ok_or(DataUriError::NotImageDataUri)?;
        Ok(Self {
            extension: extension.to_string(),
            bytes: b64().decode(payload)?,
        })
    }
}

// ---------------------------------------------------------------------------
// クライアント向けフィールド表現
// ---------------------------------------------------------------------------

/// 署名パッドの表示フラグ。
/// 未設定の項目はシリアライズ時に省略される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    /// モーダル内で編集する
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_in_modal: Option<bool>,
    /// 詳細画面で全幅表示する
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_width_on_detail: Option<bool>,
    /// 署名パッドの高さ（px）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad_height: Option<u32>,
}

/// クライアントコンポーネントに渡すフィールドのJSON表現。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldView {
    /// クライアント側コンポーネント名
    pub component: String,
    /// 表示名
    pub name: String,
    /// 属性キー
    pub attribute: String,
    /// resolve済みの表示値
    pub value: serde_json::Value,
    /// 表示フラグ（トップレベルに展開される）
    #[serde(flatten)]
    pub meta: FieldMeta,
}
