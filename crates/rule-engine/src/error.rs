//! 规则引擎错误类型

use thiserror::Error;

/// 规则字符串解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("规则字符串为空: 未识别到任何词法单元")]
    EmptyInput,

    #[error("没有提供需要合并的规则")]
    EmptyRuleSet,

    #[error("括号不匹配")]
    MismatchedParentheses,

    #[error("操作数不完整: 需要 属性 比较符 值 三个词法单元, 实际剩余 {remaining} 个")]
    MalformedOperand { remaining: usize },

    #[error("无效的操作符: {0}")]
    UnknownOperator(String),

    #[error("表达式嵌套过深: 超过上限 {limit}")]
    NestingTooDeep { limit: usize },

    #[error("规则 '{rule}' 解析失败: {source}")]
    InvalidRule {
        rule: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::EmptyRuleSet => "EMPTY_RULE_SET",
            Self::MismatchedParentheses => "MISMATCHED_PARENTHESES",
            Self::MalformedOperand { .. } => "MALFORMED_OPERAND",
            Self::UnknownOperator(_) => "UNKNOWN_OPERATOR",
            Self::NestingTooDeep { .. } => "NESTING_TOO_DEEP",
            // 合并时的包装错误沿用内部错误码，调用方只关心根因
            Self::InvalidRule { source, .. } => source.code(),
        }
    }

    /// 剥离 InvalidRule 包装，返回根因
    pub fn root_cause(&self) -> &ParseError {
        match self {
            Self::InvalidRule { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// 规则求值错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("无效的操作符: {0}")]
    UnknownOperator(String),
}

impl EvalError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOperator(_) => "UNKNOWN_OPERATOR",
        }
    }
}

/// 规则服务层统一错误
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("规则执行失败: {0}")]
    Eval(#[from] EvalError),

    #[error("规则未找到: {0}")]
    RuleNotFound(u64),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RuleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.code(),
            Self::Eval(e) => e.code(),
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::JsonError(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
