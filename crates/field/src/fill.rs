//! # 書き込み経路（fill）
//!
//! リクエストのBase64 PNGをデコードしてディスクに保存し、
//! レコードの属性を新しいパスに更新した後、旧ファイルを削除する。
//!
//! 旧ファイルの削除は新ファイルの書き込み成功後にのみ行う。
//! 同一レコードへの並行fillは直列化しない（永続化層の後勝ち）。

use base64::Engine;
use rand::Rng;
use sigfield_storage::Storage;
use sigfield_types::{b64, PNG_DATA_URI_PREFIX};

use crate::error::FieldError;
use crate::field::{ResolveMode, SignatureImage};
use crate::record::{FieldRequest, Record};
use crate::token::{random_token, TOKEN_LENGTH};

/// 入力値を正規化する。
///
/// PNGのData URIプレフィックスを除去し、フォームエンコード時に
/// `+` が置き換えられた空白を `+` に戻す。
pub fn normalize_payload(payload: &str) -> String {
    payload
        .strip_prefix(PNG_DATA_URI_PREFIX)
        .unwrap_or(payload)
        .replace(' ', "+")
}

/// 入力値を正規化してデコードする。
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, FieldError> {
    Ok(b64().decode(normalize_payload(payload))?)
}

/// 保存先キー `{base}/{token}.png` を組み立てる。
pub fn object_key(base: &str, token: &str) -> String {
    match base.trim_end_matches('/') {
        "" => format!("{token}.png"),
        base => format!("{base}/{token}.png"),
    }
}

impl SignatureImage {
    /// リクエストの署名画像でレコードの属性を更新する。
    ///
    /// 新しく保存したキーを返す。入力が空の場合、および計算値フィールドでは
    /// 何もせず `None` を返す。エラー時はレコードもディスク上の旧ファイルも
    /// 変更されない。
    pub async fn fill<Q, M>(
        &self,
        storage: &Storage,
        request: &Q,
        record: &mut M,
    ) -> Result<Option<String>, FieldError>
    where
        Q: FieldRequest + ?Sized,
        M: Record + ?Sized,
    {
        let token = random_token(&mut rand::thread_rng(), TOKEN_LENGTH);
        self.fill_with_token(storage, request, record, token).await
    }

    /// 乱数源を指定して `fill` を行う。
    pub async fn fill_with_rng<Q, M, R>(
        &self,
        storage: &Storage,
        request: &Q,
        record: &mut M,
        rng: &mut R,
    ) -> Result<Option<String>, FieldError>
    where
        Q: FieldRequest + ?Sized,
        M: Record + ?Sized,
        R: Rng + ?Sized,
    {
        let token = random_token(rng, TOKEN_LENGTH);
        self.fill_with_token(storage, request, record, token).await
    }

    async fn fill_with_token<Q, M>(
        &self,
        storage: &Storage,
        request: &Q,
        record: &mut M,
        token: String,
    ) -> Result<Option<String>, FieldError>
    where
        Q: FieldRequest + ?Sized,
        M: Record + ?Sized,
    {
        if let ResolveMode::Computed(_) = self.mode {
            tracing::debug!(attribute = %self.attribute, "計算値フィールドのためfillをスキップ");
            return Ok(None);
        }

        let disk = self.configured_disk(storage)?;
        let base = self.configured_path()?;

        let Some(payload) = request.input(&self.attribute).filter(|p| !p.is_empty()) else {
            tracing::debug!(attribute = %self.attribute, "署名画像の入力なし");
            return Ok(None);
        };

        let old_key = record.attribute(&self.attribute);
        let bytes = decode_payload(payload)?;
        let key = object_key(base, &token);

        disk.put(&key, &bytes).await.map_err(FieldError::StorageWrite)?;
        record.set_attribute(&self.attribute, key.clone());

        // 書き込み成功後に旧ファイルを削除。失敗してもfillは確定済み
        if let Some(old_key) = old_key.filter(|old| !old.is_empty() && *old != key) {
            if let Err(e) = disk.delete(&old_key).await {
                tracing::warn!(
                    attribute = %self.attribute,
                    old_key = %old_key,
                    error = %e,
                    "旧署名画像の削除に失敗"
                );
            }
        }

        tracing::debug!(
            attribute = %self.attribute,
            key = %key,
            size = bytes.len(),
            "署名画像を保存"
        );
        Ok(Some(key))
    }
}
