//! 请求与响应 DTO

use crate::models::Expression;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// API 统一响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::success(data)
        }
    }
}

/// 创建规则请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[validate(length(min = 1, max = 100, message = "规则名称长度必须在1-100个字符之间"))]
    pub name: String,
    #[validate(length(min = 1, max = 4096, message = "规则字符串长度必须在1-4096个字符之间"))]
    pub rule_string: String,
}

/// 编译规则请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    #[validate(length(min = 1, max = 4096, message = "规则字符串长度必须在1-4096个字符之间"))]
    pub rule_string: String,
}

/// 编译结果
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub ast: Expression,
    /// 规范化后的规则字符串
    pub normalized: String,
    pub attributes: Vec<String>,
    pub operand_count: usize,
    pub depth: usize,
}

impl From<Expression> for CompileResponse {
    fn from(ast: Expression) -> Self {
        Self {
            normalized: ast.to_string(),
            attributes: ast.attributes().into_iter().map(String::from).collect(),
            operand_count: ast.operand_count(),
            depth: ast.depth(),
            ast,
        }
    }
}

/// 规则求值请求
///
/// 未指定 `ruleIds` 时对全部已存储规则求值。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub rule_ids: Option<Vec<u64>>,
    pub data: Value,
}
