//! # sigfield 署名画像フィールド
//!
//! クライアントの署名パッドから送られたBase64 PNGをディスクに保存し、
//! 表示時にData URIへ戻すフィールド。
//!
//! ## 操作
//! - `SignatureImage::fill` — 入力画像を保存し、レコードの属性を新しいパスに更新、旧ファイルを削除
//! - `SignatureImage::resolve` — 属性のパスからファイルを読み出し `data:image/<拡張子>;base64,...` を返す
//!
//! ## エラー方針
//! - fill: 設定不備・デコード失敗・書き込み失敗は `FieldError` で返す。レコードは変更しない
//! - resolve: 読み出し失敗は空文字列に変換する

pub mod error;
pub mod field;
pub mod fill;
pub mod record;
pub mod resolve;
pub mod token;


pub use error::FieldError;
pub use field::{ComputeFn, PostProcessFn, ResolveMode, SignatureImage, COMPONENT};
pub use record::{FieldRequest, Record};
pub use sigfield_storage::{Disk, Storage, StorageError};
pub use sigfield_types::{DataUri, FieldMeta, FieldView};
