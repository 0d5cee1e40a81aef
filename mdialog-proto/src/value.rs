//! Typed scalar values carried by `VALUE` and `D:VALUE` lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type tag written in front of a typed value (`<type>:<value>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ValueType {
    /// No value (`none`).
    None,
    /// Boolean (`bool`).
    Bool,
    /// Signed integer (`int`).
    Int,
    /// Single-line string (`str`).
    Str,
    /// List of strings (`multi-str`).
    ///
    /// Only meaningful for environment typing; it never appears inside a
    /// single-line value and is rejected there.
    MultiStr,
}

impl ValueType {
    /// Wire spelling of the tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Str => "str",
            Self::MultiStr => "multi-str",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "multi-str" => Ok(Self::MultiStr),
            _ => Err(format!("unknown value type: {s}")),
        }
    }
}

/// A single-line typed value.
///
/// `None` is the protocol's explicit "no value", not a missing reply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
#[allow(clippy::exhaustive_enums)]
pub enum Value {
    /// Explicitly empty.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Text without newlines.
    Str(String),
}

impl Value {
    /// Returns the type tag matching this value's variant.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::None => ValueType::None,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Str(_) => ValueType::Str,
        }
    }

    /// Parses the text part of a `<type>:<value>` pair.
    ///
    /// `none` ignores `text`; `bool` is false only for `FALSE`, `False`
    /// and `F`. Returns `None` for tags that cannot be carried on one line.
    pub(crate) fn parse_typed(
        ty: ValueType,
        text: &str,
    ) -> Option<Result<Self, std::num::ParseIntError>> {
        let value = match ty {
            ValueType::None => Self::None,
            ValueType::Bool => Self::Bool(!matches!(text, "FALSE" | "False" | "F")),
            ValueType::Int => return Some(text.parse().map(Self::Int)),
            ValueType::Str => Self::Str(text.to_owned()),
            ValueType::MultiStr => return None,
        };
        Some(Ok(value))
    }

    /// Returns the contained text, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders the wire form of the value (without its type tag).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}
