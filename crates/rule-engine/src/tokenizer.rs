//! 规则字符串词法分析
//!
//! 从左到右贪婪匹配：括号、单引号字符串、比较符号串、裸词。
//! 空白和无法识别的字符直接跳过，不报错。

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// 词法规则，按优先级排列
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(|\)|'[^']*'|[<>=]+|[0-9A-Za-z_]+").expect("token pattern is valid")
});

/// 词法单元，借用原始规则字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    LParen,
    RParen,
    /// 单引号字符串，保留两侧引号
    Quoted(&'a str),
    /// 比较符号串，如 `>=`，也可能是 `=>` 这类无效组合
    Symbol(&'a str),
    /// 标识符、关键字或数字
    Word(&'a str),
}

impl<'a> Token<'a> {
    /// 原始文本
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Quoted(raw) | Self::Symbol(raw) | Self::Word(raw) => raw,
        }
    }

    fn classify(raw: &'a str) -> Self {
        match raw.as_bytes().first() {
            Some(b'(') => Self::LParen,
            Some(b')') => Self::RParen,
            Some(b'\'') => Self::Quoted(raw),
            Some(b'<' | b'>' | b'=') => Self::Symbol(raw),
            _ => Self::Word(raw),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 将规则字符串切分为词法单元序列
///
/// 没有任何可识别内容时返回空序列，由解析器负责报错。
pub fn tokenize(rule: &str) -> Vec<Token<'_>> {
    TOKEN_PATTERN
        .find_iter(rule)
        .map(|m| Token::classify(m.as_str()))
        .collect()
}
