//! 规则操作符定义
//!
//! 解析器按位置读取比较符与连接词，不认识的原始文本保存在 `Unknown` 中，
//! 直到求值（或严格模式下的解析）时才被拒绝。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 比较符
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Comparator {
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
    /// 未识别的原始文本
    Unknown(String),
}

impl Comparator {
    /// 从符号解析，不认识的符号保留为 `Unknown`
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            ">" => Self::Gt,
            "<" => Self::Lt,
            "=" => Self::Eq,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Comparator {
    fn from(raw: String) -> Self {
        Self::from_symbol(&raw)
    }
}

impl From<Comparator> for String {
    fn from(op: Comparator) -> Self {
        match op {
            Comparator::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// 逻辑连接词
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Connective {
    And,
    Or,
    /// 未识别的原始文本
    Unknown(String),
}

impl Connective {
    /// 从关键字解析（区分大小写），不认识的关键字保留为 `Unknown`
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "AND" => Self::And,
            "OR" => Self::Or,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Connective {
    fn from(raw: String) -> Self {
        Self::from_keyword(&raw)
    }
}

impl From<Connective> for String {
    fn from(op: Connective) -> Self {
        match op {
            Connective::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}
