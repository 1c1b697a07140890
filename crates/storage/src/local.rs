//! # ローカルファイルシステム ディスク
//!
//! ローカルディレクトリ配下にオブジェクトをファイルとして保存する。
//! 開発・単一ノード環境用。

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{Disk, StorageError};

/// ローカルディレクトリに保存するディスク。
///
/// ディレクトリ構成: `{root}/{key}`
/// URL形式: `{public_url}/{key}`
pub struct LocalDisk {
    root: PathBuf,
    public_url: String,
}

impl LocalDisk {
    /// 新しいLocalDiskを作成する。
    ///
    /// # 引数
    /// - `root`: オブジェクトを格納するディレクトリパス
    /// - `public_url`: `url()` が返すURLのベース（例: "/storage", "https://cdn.example.com"）
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    /// 環境変数から構築する。
    pub fn from_env() -> Self {
        let root = std::env::var("LOCAL_DISK_ROOT").unwrap_or_else(|_| "./storage".to_string());
        let public_url =
            std::env::var("LOCAL_DISK_URL").unwrap_or_else(|_| "/storage".to_string());

        tracing::info!(root = %root, public_url = %public_url, "ローカルディスクを設定");
        Self::new(root, public_url)
    }

    /// キーをルート配下の絶対パスに変換する。
    /// `..` や絶対パスなど、ルート外を指すキーは拒否する。
    fn full_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || !is_contained {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(key: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
        _ => StorageError::Io(format!("{key}: {e}")),
    }
}

#[async_trait::async_trait]
impl Disk for LocalDisk {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.full_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(key, e))?;
        tracing::debug!(key = %key, size = bytes.len(), "local disk: put");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.full_path(key)?;
        tokio::fs::read(&path).await.map_err(|e| io_error(key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.full_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let disk = LocalDisk::new(dir.path(), "/storage");

        disk.put("signatures/a.png", b"hello").await.unwrap();
        assert!(dir.path().join("signatures/a.png").exists());
        assert_eq!(disk.get("signatures/a.png").await.unwrap(), b"hello");

        disk.delete("signatures/a.png").await.unwrap();
        assert!(!dir.path().join("signatures/a.png").exists());
        assert!(matches!(
            disk.get("signatures/a.png").await,
            Err(StorageError::NotFound(_))
        ));

        // 存在しないファイルの削除はエラーにならない
        disk.delete("signatures/a.png").await.unwrap();
    }

    /// ルート外を指すキーが拒否されることを確認
    #[tokio::test]
    async fn test_local_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let disk = LocalDisk::new(dir.path(), "/storage");

        for key in ["../outside.png", "signatures/../../x.png", "/etc/passwd", ""] {
            assert!(
                matches!(disk.put(key, b"x").await, Err(StorageError::InvalidKey(_))),
                "キーが拒否されなかった: {key}"
            );
        }
    }

    #[test]
    fn test_local_url() {
        let disk = LocalDisk::new("/var/data", "https://cdn.example.com/");
        assert_eq!(
            disk.url("signatures/a.png"),
            "https://cdn.example.com/signatures/a.png"
        );
    }
}
