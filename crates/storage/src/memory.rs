//! # メモリ ディスク
//!
//! プロセス内のHashMapにオブジェクトを保持する。テスト・開発用。

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{Disk, StorageError};

/// プロセス内メモリに保持するディスク。
///
/// URL形式: `memory://{name}/{key}`
pub struct MemoryDisk {
    name: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDisk {
    /// 空のMemoryDiskを作成する。
    ///
    /// # 引数
    /// - `name`: URLのホスト部に使う名前
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// `key` のオブジェクトが存在するか。
    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// 保持しているオブジェクト数。
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// オブジェクトを1つも保持していないか。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl Disk for MemoryDisk {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        format!("memory://{}/{key}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_put_get_delete() {
        let disk = MemoryDisk::new("test");
        disk.put("signatures/a.png", b"hello").await.unwrap();

        assert!(disk.contains("signatures/a.png"));
        assert_eq!(disk.get("signatures/a.png").await.unwrap(), b"hello");

        disk.delete("signatures/a.png").await.unwrap();
        assert!(disk.is_empty());
        assert!(matches!(
            disk.get("signatures/a.png").await,
            Err(StorageError::NotFound(_))
        ));

        // 存在しないキーの削除はエラーにならない
        disk.delete("signatures/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_rejects_empty_key() {
        let disk = MemoryDisk::new("test");
        assert!(matches!(
            disk.put("", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
