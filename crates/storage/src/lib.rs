//! # ストレージディスク
//!
//! 署名画像の保存先となるディスクの抽象インターフェースと、
//! 名前付きディスクのレジストリ。
//!
//! ## ディスク実装
//! - `MemoryDisk`: プロセス内メモリに保持する（テスト用）
//! - `LocalDisk`: ローカルディレクトリに保存する（開発・単一ノード用）
//! - `S3Disk`: S3互換ストレージに保存する（本番用、`vendor-aws` feature）

pub mod error;
pub mod local;
pub mod memory;
#[cfg(feature = "vendor-aws")]
pub mod s3;

pub use error::StorageError;
pub use local::LocalDisk;
pub use memory::MemoryDisk;
#[cfg(feature = "vendor-aws")]
pub use s3::{S3Disk, S3DiskConfig};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// パスでアドレス可能なストレージバックエンド。
///
/// ローカルディレクトリ、S3互換バケット等をディスクとして差し替えられる。
/// `delete` は冪等であり、存在しないキーに対してもエラーを返さない。
#[async_trait::async_trait]
pub trait Disk: Send + Sync {
    /// `key` にバイト列を書き込む。既存のオブジェクトは上書きされる。
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// `key` のバイト列を読み出す。
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// `key` のオブジェクトを削除する。
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// `key` を参照するURLを返す。I/Oは発生しない。
    fn url(&self, key: &str) -> String;
}

/// 名前付きディスクのレジストリ。
///
/// フィールドはディスクを名前で参照し、fill/resolveの呼び出し時に
/// このレジストリから実体を解決する。
#[derive(Clone, Default)]
pub struct Storage {
    disks: HashMap<String, Arc<dyn Disk>>,
}

impl Storage {
    /// 空のレジストリを作成する。
    pub fn new() -> Self {
        Self::default()
    }

    /// ディスクを登録したレジストリを返す。同名のディスクは置き換えられる。
    pub fn with_disk(mut self, name: impl Into<String>, disk: Arc<dyn Disk>) -> Self {
        self.insert(name, disk);
        self
    }

    /// ディスクを登録する。同名のディスクは置き換えられる。
    pub fn insert(&mut self, name: impl Into<String>, disk: Arc<dyn Disk>) {
        self.disks.insert(name.into(), disk);
    }

    /// 名前からディスクを取得する。
    pub fn disk(&self, name: &str) -> Option<Arc<dyn Disk>> {
        self.disks.get(name).cloned()
    }

    /// 環境変数から構築する。
    ///
    /// - `local`: 常に登録（`LocalDisk::from_env`）
    /// - `s3`: `vendor-aws` 有効かつ `S3_BUCKET` 設定時に登録（`S3DiskConfig::from_env`）
    pub fn from_env() -> anyhow::Result<Self> {
        let storage = Self::new().with_disk("local", Arc::new(LocalDisk::from_env()));

        #[cfg(feature = "vendor-aws")]
        let storage = match S3DiskConfig::from_env() {
            Some(config) => storage.with_disk("s3", Arc::new(S3Disk::connect(&config)?)),
            None => storage,
        };

        tracing::info!(disks = ?storage.names(), "ストレージディスクを登録");
        Ok(storage)
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.disks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("disks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_lookup() {
        let storage = Storage::new().with_disk("memory", Arc::new(MemoryDisk::new("memory")));

        assert!(storage.disk("memory").is_some());
        assert!(storage.disk("public").is_none());
        assert_eq!(format!("{storage:?}"), r#"Storage { disks: ["memory"] }"#);
    }

    /// 同名で登録したディスクが置き換えられることを確認
    #[tokio::test]
    async fn test_storage_replaces_disk() {
        let first = Arc::new(MemoryDisk::new("first"));
        first.put("a.png", b"1").await.unwrap();

        let storage = Storage::new()
            .with_disk("public", first)
            .with_disk("public", Arc::new(MemoryDisk::new("second")));

        let disk = storage.disk("public").unwrap();
        assert!(matches!(
            disk.get("a.png").await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(disk.url("a.png"), "memory://second/a.png");
    }

    /// 環境変数からローカルディスクが登録され、S3_BUCKETがなければs3は登録されないことを確認。
    /// 環境変数を変更するテストはこの1件のみ
    #[tokio::test]
    async fn test_storage_from_env() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("LOCAL_DISK_ROOT", dir.path());
        std::env::set_var("LOCAL_DISK_URL", "https://cdn.example.com/storage/");
        std::env::remove_var("S3_BUCKET");

        let local = LocalDisk::from_env();
        assert_eq!(
            local.url("signatures/a.png"),
            "https://cdn.example.com/storage/signatures/a.png"
        );

        let storage = Storage::from_env().unwrap();
        assert_eq!(storage.names(), vec!["local"]);

        let disk = storage.disk("local").unwrap();
        disk.put("signatures/a.png", b"hello").await.unwrap();
        assert!(dir.path().join("signatures/a.png").exists());
        assert_eq!(
            disk.url("signatures/a.png"),
            "https://cdn.example.com/storage/signatures/a.png"
        );
    }
}
