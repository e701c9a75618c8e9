//! Typed decoding of untyped JSON values.
//!
//! Every entity has its own [`Decode`] implementation that walks the value
//! field by field. Failures carry the path of the offending field, e.g.
//! `horses[2].results[0].date`, instead of silently producing defaults.

use crate::domain::model::Label;
use crate::utils::error::{EtlError, Result};
use serde_json::{Map, Value};
use std::fmt;

/// 欄位路徑，用於錯誤訊息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{}", self.0, key))
        }
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("$")
        } else {
            f.write_str(&self.0)
        }
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn type_mismatch(path: &FieldPath, expected: &'static str, found: &Value) -> EtlError {
    EtlError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: type_name(found),
    }
}

pub fn invalid_value(path: &FieldPath, value: impl fmt::Display, reason: impl Into<String>) -> EtlError {
    EtlError::InvalidValue {
        path: path.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub trait Decode: Sized {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self>;
}

/// 頂層實體：允許輸入為尚未解析的 JSON 文字
pub trait Entity: Decode {
    const NAME: &'static str;
}

impl Decode for Value {
    fn decode(value: &Value, _path: &FieldPath) -> Result<Self> {
        Ok(value.clone())
    }
}

impl Decode for String {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(type_mismatch(path, "string", other)),
        }
    }
}

impl Decode for bool {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| type_mismatch(path, "boolean", value))
    }
}

impl Decode for i64 {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| invalid_value(path, n, "expected an integer")),
            other => Err(type_mismatch(path, "integer", other)),
        }
    }
}

impl Decode for u32 {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        let raw = i64::decode(value, path)?;
        if raw < 0 {
            return Err(invalid_value(path, raw, "must not be negative"));
        }
        u32::try_from(raw).map_err(|_| invalid_value(path, raw, "out of range"))
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other, path).map(Some),
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::decode(item, &path.index(i)))
                .collect(),
            other => Err(type_mismatch(path, "array", other)),
        }
    }
}

/// 逐欄位讀取 JSON 物件
pub struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: &'a FieldPath,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a Value, path: &'a FieldPath) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(type_mismatch(path, "object", other)),
        }
    }

    pub fn path(&self) -> &FieldPath {
        self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// 缺少或為 null 時回傳 `MissingField`
    pub fn required<T: Decode>(&self, key: &str) -> Result<T> {
        let path = self.path.key(key);
        match self.present(key) {
            Some(value) => T::decode(value, &path),
            None => Err(EtlError::MissingField {
                path: path.to_string(),
            }),
        }
    }

    pub fn optional<T: Decode>(&self, key: &str) -> Result<Option<T>> {
        match self.present(key) {
            Some(value) => T::decode(value, &self.path.key(key)).map(Some),
            None => Ok(None),
        }
    }

    /// 缺少時視為空序列
    pub fn sequence<T: Decode>(&self, key: &str) -> Result<Vec<T>> {
        match self.present(key) {
            Some(value) => Vec::<T>::decode(value, &self.path.key(key)),
            None => Ok(Vec::new()),
        }
    }

    /// 空字串代表未知，回傳 `None`
    pub fn label<T: Label>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path.key(key);
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => T::from_label(s.trim()).map(Some).ok_or_else(|| {
                invalid_value(&path, s, format!("unknown {}", T::KIND))
            }),
            Some(other) => Err(type_mismatch(&path, "string", other)),
        }
    }
}

/// 直接從值解碼，不接受 JSON 文字
pub fn decode<T: Decode>(value: &Value) -> Result<T> {
    T::decode(value, &FieldPath::root())
}

/// 接受已解析的值或包著 JSON 文字的字串
pub fn decode_value<T: Entity>(value: &Value) -> Result<T> {
    match value {
        Value::String(text) => {
            tracing::trace!("Decoding {} from encoded JSON text", T::NAME);
            decode_str(text)
        }
        other => decode(other),
    }
}

pub fn decode_str<T: Decode>(text: &str) -> Result<T> {
    let value: Value = serde_json::from_str(text)?;
    decode(&value)
}

/// 缺少或 null 時不報錯，回傳 `None`
pub fn decode_optional<T: Decode>(value: Option<&Value>) -> Result<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(value).map(Some),
    }
}
