//! # ランダムトークン
//!
//! 保存ファイル名に使う英数字トークンを生成する。
//! 乱数源は呼び出し元から渡す（テストではシード固定のRNGを使う）。

use rand::distributions::Alphanumeric;
use rand::Rng;

/// 保存ファイル名のトークン長。
pub const TOKEN_LENGTH: usize = 25;

/// `len` 文字の英数字トークンを生成する。
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
