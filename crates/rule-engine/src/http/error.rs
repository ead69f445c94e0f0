//! HTTP 层错误类型
//!
//! 将规则服务错误映射为 HTTP 状态码与统一响应体。

use crate::error::{EvalError, ParseError, RuleError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// API 错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("规则解析失败: {0}")]
    Parse(ParseError),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("规则不存在: {0}")]
    RuleNotFound(u64),

    #[error("规则执行失败: {0}")]
    Evaluation(EvalError),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RuleNotFound(_) => StatusCode::NOT_FOUND,
            // 规则本身可以解析，但无法对数据求值
            Self::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::Evaluation(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 内部错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Parse(e) => Self::Parse(e),
            RuleError::Eval(e) => Self::Evaluation(e),
            RuleError::RuleNotFound(id) => Self::RuleNotFound(id),
            RuleError::Validation(msg) => Self::Validation(msg),
            RuleError::JsonError(e) => Self::Internal(format!("JSON 处理错误: {}", e)),
        }
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
