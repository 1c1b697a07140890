//! # S3互換 ディスク実装
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIを使用するディスク実装。

use super::{Disk, StorageError};

/// S3ディスクの接続設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3DiskConfig {
    /// 読み書きに使うエンドポイント（例: "http://minio:9000"）
    pub endpoint: String,
    /// `url()` に使うクライアント向けエンドポイント。Noneならendpoint
    pub public_endpoint: Option<String>,
    /// バケット名
    pub bucket: String,
    /// リージョン。Noneならendpointから推定する
    pub region: Option<String>,
    /// アクセスキー
    pub access_key: String,
    /// シークレットキー
    pub secret_key: String,
}

impl S3DiskConfig {
    /// 変数の取得関数から設定を組み立てる。`S3_BUCKET` がなければNone。
    ///
    /// | 変数 | 既定値 |
    /// |------|--------|
    /// | `S3_BUCKET` | （必須） |
    /// | `S3_ENDPOINT` | `http://localhost:9000` |
    /// | `S3_PUBLIC_ENDPOINT` | なし |
    /// | `S3_REGION` | endpointから推定 |
    /// | `S3_ACCESS_KEY` / `S3_SECRET_KEY` | `minioadmin` |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            bucket: lookup("S3_BUCKET")?,
            endpoint: lookup("S3_ENDPOINT").unwrap_or_else(|| "http://localhost:9000".to_string()),
            public_endpoint: lookup("S3_PUBLIC_ENDPOINT"),
            region: lookup("S3_REGION"),
            access_key: lookup("S3_ACCESS_KEY").unwrap_or_else(|| "minioadmin".to_string()),
            secret_key: lookup("S3_SECRET_KEY").unwrap_or_else(|| "minioadmin".to_string()),
        })
    }

    /// 環境変数から設定を組み立てる。
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 使用するリージョン。
    /// `s3.REGION.amazonaws.com` 形式のendpointならREGION、それ以外はus-east-1。
    pub fn region(&self) -> String {
        if let Some(region) = &self.region {
            return region.clone();
        }
        self.endpoint
            .split_once("s3.")
            .and_then(|(_, rest)| rest.split_once(".amazonaws.com"))
            .map_or_else(|| "us-east-1".to_string(), |(region, _)| region.to_string())
    }

    /// endpointに対するパススタイルのバケットを作成する。
    fn bucket_at(&self, endpoint: &str) -> anyhow::Result<s3::Bucket> {
        let region = s3::Region::Custom {
            region: self.region(),
            endpoint: endpoint.to_string(),
        };
        let credentials = s3::creds::Credentials::new(
            Some(self.access_key.as_str()),
            Some(self.secret_key.as_str()),
            None,
            None,
            None,
        )?;
        let bucket = s3::Bucket::new(&self.bucket, region, credentials)?.with_path_style();
        Ok(*bucket)
    }
}

/// S3互換ストレージによるディスク実装。
pub struct S3Disk {
    /// 読み書き用バケット
    bucket: s3::Bucket,
    /// `url()` 用バケット。Noneの場合はbucketを使用する
    bucket_public: Option<s3::Bucket>,
}

impl S3Disk {
    /// S3互換バケットからディスクを構築する。
    pub fn new(bucket: s3::Bucket, bucket_public: Option<s3::Bucket>) -> Self {
        Self {
            bucket,
            bucket_public,
        }
    }

    /// 設定からディスクを構築する。ネットワーク接続は発生しない。
    pub fn connect(config: &S3DiskConfig) -> anyhow::Result<Self> {
        let bucket = config.bucket_at(&config.endpoint)?;
        let bucket_public = config
            .public_endpoint
            .as_deref()
            .map(|endpoint| config.bucket_at(endpoint))
            .transpose()?;

        tracing::info!(
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            public_endpoint = ?config.public_endpoint,
            "S3ディスクを設定"
        );
        Ok(Self::new(bucket, bucket_public))
    }
}

/// 非2xxレスポンスをエラーに変換する。
fn check_status(key: &str, op: &str, status: u16) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        _ => Err(StorageError::Backend(format!(
            "{op} {key}: ステータス {status}"
        ))),
    }
}

#[async_trait::async_trait]
impl Disk for S3Disk {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object(key, bytes)
            .await
            .map_err(|e| StorageError::Backend(format!("PUT {key}: {e}")))?;
        check_status(key, "PUT", response.status_code())?;
        tracing::debug!(key = %key, size = bytes.len(), "s3 disk: put");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("GET {key}: {e}")))?;
        check_status(key, "GET", response.status_code())?;
        Ok(response.bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("DELETE {key}: {e}")))?;
        match check_status(key, "DELETE", response.status_code()) {
            Err(StorageError::NotFound(_)) => Ok(()),
            other => other,
        }
    }

    fn url(&self, key: &str) -> String {
        let bucket = self.bucket_public.as_ref().unwrap_or(&self.bucket);
        format!("{}/{}", bucket.url(), key.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status("a.png", "GET", 200).is_ok());
        assert!(check_status("a.png", "DELETE", 204).is_ok());
        assert!(matches!(
            check_status("a.png", "GET", 404),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            check_status("a.png", "PUT", 503),
            Err(StorageError::Backend(_))
        ));
    }

    fn config(vars: &[(&str, &str)]) -> Option<S3DiskConfig> {
        S3DiskConfig::from_lookup(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
    }

    /// `S3_BUCKET` がなければ設定が作られず、あれば既定値で補われることを確認
    #[test]
    fn test_config_requires_bucket() {
        assert_eq!(config(&[("S3_ENDPOINT", "http://minio:9000")]), None);

        let config = config(&[("S3_BUCKET", "signatures")]).unwrap();
        assert_eq!(
            config,
            S3DiskConfig {
                endpoint: "http://localhost:9000".to_string(),
                public_endpoint: None,
                bucket: "signatures".to_string(),
                region: None,
                access_key: "minioadmin".to_string(),
                secret_key: "minioadmin".to_string(),
            }
        );
    }

    #[test]
    fn test_config_region() {
        let aws = config(&[
            ("S3_BUCKET", "signatures"),
            ("S3_ENDPOINT", "https://s3.ap-northeast-1.amazonaws.com"),
        ])
        .unwrap();
        assert_eq!(aws.region(), "ap-northeast-1");

        let minio = config(&[("S3_BUCKET", "signatures"), ("S3_ENDPOINT", "http://minio:9000")])
            .unwrap();
        assert_eq!(minio.region(), "us-east-1");

        let explicit = config(&[
            ("S3_BUCKET", "signatures"),
            ("S3_ENDPOINT", "https://s3.ap-northeast-1.amazonaws.com"),
            ("S3_REGION", "eu-west-1"),
        ])
        .unwrap();
        assert_eq!(explicit.region(), "eu-west-1");
    }

    /// パススタイルのバケットURLにキーが連結され、公開エンドポイントが優先されることを確認
    #[test]
    fn test_s3_url_uses_public_endpoint() {
        let internal = config(&[("S3_BUCKET", "signatures"), ("S3_ENDPOINT", "http://minio:9000")])
            .unwrap();
        let disk = S3Disk::connect(&internal).unwrap();
        assert_eq!(
            disk.url("sig/a.png"),
            "http://minio:9000/signatures/sig/a.png"
        );

        let public = S3DiskConfig {
            public_endpoint: Some("https://files.example.com".to_string()),
            ..internal
        };
        let disk = S3Disk::connect(&public).unwrap();
        assert_eq!(
            disk.url("sig/a.png"),
            "https://files.example.com/signatures/sig/a.png"
        );
    }
}
