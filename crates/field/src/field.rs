//! # 署名画像フィールド
//!
//! フィールドの設定と、resolve方式（保存ファイル / 計算値）の定義。
//! 書き込みは `fill.rs`、読み出しは `resolve.rs` を参照。

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use sigfield_storage::{Disk, Storage};
use sigfield_types::{FieldMeta, FieldView};

use crate::error::FieldError;
use crate::record::Record;

/// クライアント側コンポーネント名。
pub const COMPONENT: &str = "nova-signature-field";

/// 計算値フィールドの属性名。
pub const COMPUTED_ATTRIBUTE: &str = "ComputedField";

/// レコードから表示値を計算する関数。
pub type ComputeFn = Arc<dyn Fn(&dyn Record) -> Value + Send + Sync>;

/// 保存ファイルから得た表示値を加工する関数。
/// 引数は（表示値, レコード, 属性キー）。
pub type PostProcessFn = Arc<dyn Fn(Value, &dyn Record, &str) -> Value + Send + Sync>;

/// 表示値の決定方式。構築時に確定する。
#[derive(Clone)]
pub enum ResolveMode {
    /// 保存済みファイルを読み出してData URIにする
    Stored {
        /// Data URIを加工する関数（任意）
        post_process: Option<PostProcessFn>,
    },
    /// 関数でレコードから値を計算する。ストレージI/Oなし
    Computed(ComputeFn),
}

impl fmt::Debug for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveMode::Stored { post_process } => f
                .debug_struct("Stored")
                .field("post_process", &post_process.is_some())
                .finish(),
            ResolveMode::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// 署名画像フィールド。
///
/// クライアントから送られたBase64 PNGをディスクに保存し、
/// 保存先パスをレコードの属性に記録する。表示時はファイルを読み出して
/// `data:image/<拡張子>;base64,...` に変換する。
///
/// ```ignore
/// let field = SignatureImage::new("Customer Signature")
///     .disk("public")
///     .path("signatures")
///     .pad_height(Some(240));
/// ```
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pub(crate) name: String,
    pub(crate) attribute: String,
    pub(crate) disk: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) mode: ResolveMode,
    pub(crate) meta: FieldMeta,
}

impl SignatureImage {
    /// 表示名から属性キーを導出してフィールドを作成する。
    /// 属性キーは小文字化し、空白を `_` に置き換えたもの。
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let attribute = name.to_lowercase().replace(' ', "_");
        Self::with_attribute(name, attribute)
    }

    /// 属性キーを明示してフィールドを作成する。
    pub fn with_attribute(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            disk: None,
            path: None,
            mode: ResolveMode::Stored { post_process: None },
            meta: FieldMeta::default(),
        }
    }

    /// 計算値フィールドを作成する。resolveは `compute` の戻り値をそのまま返し、
    /// fillは何もしない。
    pub fn computed<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&dyn Record) -> Value + Send + Sync + 'static,
    {
        let mut field = Self::with_attribute(name, COMPUTED_ATTRIBUTE);
        field.mode = ResolveMode::Computed(Arc::new(compute));
        field
    }

    /// 保存先ディスク名を設定する。
    pub fn disk(mut self, disk: impl Into<String>) -> Self {
        self.disk = Some(disk.into());
        self
    }

    /// ディスク内の保存先ディレクトリを設定する。
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// モーダル内で編集するか。
    pub fn edit_in_modal(mut self, edit_in_modal: bool) -> Self {
        self.meta.edit_in_modal = Some(edit_in_modal);
        self
    }

    /// 詳細画面で全幅表示するか。
    pub fn full_width_on_detail(mut self, full_width_on_detail: bool) -> Self {
        self.meta.full_width_on_detail = Some(full_width_on_detail);
        self
    }

    /// 署名パッドの高さ。Noneでクライアントの既定値。
    pub fn pad_height(mut self, pad_height: Option<u32>) -> Self {
        self.meta.pad_height = pad_height;
        self
    }

    /// 保存ファイルから得た表示値を加工する関数を設定する。
    /// 計算値フィールドでは無視される。
    pub fn resolve_using<F>(mut self, post_process: F) -> Self
    where
        F: Fn(Value, &dyn Record, &str) -> Value + Send + Sync + 'static,
    {
        if let ResolveMode::Stored { post_process: slot } = &mut self.mode {
            *slot = Some(Arc::new(post_process));
        }
        self
    }

    /// 表示名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 属性キー（リクエストキーも兼ねる）
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// 表示値の決定方式
    pub fn mode(&self) -> &ResolveMode {
        &self.mode
    }

    /// 表示フラグ
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    /// resolve済みの値からクライアント向けJSON表現を構築する。
    pub fn view(&self, value: Value) -> FieldView {
        FieldView {
            component: COMPONENT.to_string(),
            name: self.name.clone(),
            attribute: self.attribute.clone(),
            value,
            meta: self.meta.clone(),
        }
    }

    /// 設定されたディスクをレジストリから取得する。
    pub(crate) fn configured_disk(&self, storage: &Storage) -> Result<Arc<dyn Disk>, FieldError> {
        let name = self.disk.as_deref().ok_or_else(|| {
            FieldError::Configuration(format!("{}: ディスクが設定されていません", self.attribute))
        })?;
        storage.disk(name).ok_or_else(|| {
            FieldError::Configuration(format!("{}: 未登録のディスク: {name}", self.attribute))
        })
    }

    /// 設定された保存先ディレクトリ。
    pub(crate) fn configured_path(&self) -> Result<&str, FieldError> {
        self.path.as_deref().ok_or_else(|| {
            FieldError::Configuration(format!(
                "{}: 保存先パスが設定されていません",
                self.attribute
            ))
        })
    }
}
