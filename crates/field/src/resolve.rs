//! # 読み出し経路（resolve）
//!
//! レコードの属性から表示値を求める。保存ファイル方式ではファイルを読み出して
//! Data URIに変換する。読み出しに失敗した場合は空文字列を返し、
//! エラーは呼び出し元に伝播しない。

use serde_json::Value;
use sigfield_storage::{Disk, Storage, StorageError};
use sigfield_types::{DataUri, DEFAULT_EXTENSION};

use crate::field::{ResolveMode, SignatureImage};
use crate::record::Record;

/// URLのパス末尾から拡張子を推定する。拡張子がなければ `jpg`。
///
/// クエリ・フラグメント、およびスキーム付きURLのホスト部は対象外。
pub fn infer_extension(url: &str) -> &str {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => url,
    };
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => DEFAULT_EXTENSION,
    }
}

/// ディスクから保存ファイルを読み出す。
async fn fetch(disk: &dyn Disk, key: &str) -> Result<Vec<u8>, StorageError> {
    disk.get(key).await
}

impl SignatureImage {
    /// レコードの表示値を求める。
    ///
    /// `attribute` を指定するとフィールドの属性キーの代わりに使う
    /// （計算値フィールドでは無視される）。
    pub async fn resolve<R: Record>(
        &self,
        storage: &Storage,
        resource: &R,
        attribute: Option<&str>,
    ) -> Value {
        let attribute = attribute.unwrap_or(&self.attribute);
        match &self.mode {
            ResolveMode::Computed(compute) => compute(resource as &dyn Record),
            ResolveMode::Stored { post_process } => {
                let display =
                    Value::String(self.resolve_stored(storage, resource, attribute).await);
                match post_process {
                    Some(post_process) => {
                        post_process(display, resource as &dyn Record, attribute)
                    }
                    None => display,
                }
            }
        }
    }

    /// 保存ファイルをData URIに変換する。取得できなければ空文字列。
    async fn resolve_stored<R: Record>(
        &self,
        storage: &Storage,
        resource: &R,
        attribute: &str,
    ) -> String {
        let Some(key) = resource.attribute(attribute).filter(|key| !key.is_empty()) else {
            return String::new();
        };

        let disk = match self.configured_disk(storage) {
            Ok(disk) => disk,
            Err(e) => {
                tracing::warn!(attribute = %attribute, error = %e, "署名画像を表示できません");
                return String::new();
            }
        };

        let url = disk.url(&key);
        let extension = infer_extension(&url);

        match fetch(disk.as_ref(), &key).await {
            Ok(bytes) => DataUri::new(extension, bytes).to_string(),
            Err(e) => {
                tracing::warn!(
                    attribute = %attribute,
                    key = %key,
                    error = %e,
                    "署名画像の取得に失敗"
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_extension() {
        assert_eq!(infer_extension("/storage/signatures/a.png"), "png");
        assert_eq!(infer_extension("https://cdn.example.com/sig/a.webp?v=2#x"), "webp");
        assert_eq!(infer_extension("memory://public/sig/a.gif"), "gif");
    }

    /// 拡張子のないURLでは `jpg` になることを確認
    #[test]
    fn test_infer_extension_defaults_to_jpg() {
        assert_eq!(infer_extension("https://cdn.example.com/sig/abc"), "jpg");
        assert_eq!(infer_extension("https://cdn.example.com"), "jpg");
        assert_eq!(infer_extension("https://cdn.example.com/v1.2/abc"), "jpg");
        assert_eq!(infer_extension("/storage/sig/abc."), "jpg");
    }
}
