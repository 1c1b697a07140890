//! # レコード・リクエスト
//!
//! フィールドが読み書きする外部コラボレーターの抽象。
//! ホスト側のモデルやフォームデータをこれらのトレイトで包んで渡す。

use std::collections::HashMap;

use serde_json::Value;

/// 属性をキーで読み書きできるレコード（モデル）。
pub trait Record {
    /// 属性値を返す。未設定またはnullの場合はNone。
    fn attribute(&self, key: &str) -> Option<String>;

    /// 属性値を設定する。
    fn set_attribute(&mut self, key: &str, value: String);
}

/// キーで入力値を取り出せるリクエスト。
pub trait FieldRequest {
    /// 入力値を返す。存在しない、または文字列でない場合はNone。
    fn input(&self, key: &str) -> Option<&str>;
}

impl Record for HashMap<String, String> {
    fn attribute(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }

    fn set_attribute(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl Record for serde_json::Map<String, Value> {
    fn attribute(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn set_attribute(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), Value::String(value));
    }
}

impl FieldRequest for HashMap<String, String> {
    fn input(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl FieldRequest for Value {
    fn input(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}
