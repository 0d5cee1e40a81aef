//! Installer environment values as exchanged by `env-get` / `env-query`.

use std::fmt;

use mdialog_proto::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// An environment entry: a single typed value or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[allow(clippy::exhaustive_enums)]
pub enum EnvValue {
    /// Sent with `env-query`, answered through `Q:VALUE`.
    Scalar(Value),
    /// Sent with `env-query-multi`, answered through `Q:MULTI-STRING`.
    Multi(Vec<String>),
}

impl EnvValue {
    /// Type tag of the entry; lists report `multi-str`.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Scalar(v) => v.value_type(),
            Self::Multi(_) => ValueType::MultiStr,
        }
    }

    /// Returns the scalar, if this is one.
    pub const fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Multi(_) => None,
        }
    }

    /// Returns the lines, if this is a list.
    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            Self::Multi(lines) => Some(lines),
            Self::Scalar(_) => None,
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{}:{v}", v.value_type()),
            Self::Multi(lines) => write!(f, "{}:{}", ValueType::MultiStr, lines.join("\\n")),
        }
    }
}

impl From<Value> for EnvValue {
    fn from(v: Value) -> Self {
        Self::Scalar(v)
    }
}

impl From<bool> for EnvValue {
    fn from(b: bool) -> Self {
        Self::Scalar(b.into())
    }
}

impl From<i64> for EnvValue {
    fn from(n: i64) -> Self {
        Self::Scalar(n.into())
    }
}

impl From<i32> for EnvValue {
    fn from(n: i32) -> Self {
        Self::Scalar(n.into())
    }
}

impl From<&str> for EnvValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<String> for EnvValue {
    fn from(s: String) -> Self {
        Self::Scalar(s.into())
    }
}

impl From<Vec<String>> for EnvValue {
    fn from(lines: Vec<String>) -> Self {
        Self::Multi(lines)
    }
}

impl From<&[&str]> for EnvValue {
    fn from(lines: &[&str]) -> Self {
        Self::Multi(lines.iter().map(|s| (*s).to_owned()).collect())
    }
}
