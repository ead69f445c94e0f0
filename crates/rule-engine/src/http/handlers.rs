//! 规则 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;
use validator::Validate;

use super::dto::{ApiResponse, CompileRequest, CompileResponse, CreateRuleRequest, EvaluateRequest};
use super::error::ApiError;
use super::state::AppState;
use crate::executor::RuleSetOutcome;
use crate::models::DataRecord;
use crate::store::{NewRule, StoredRule};

/// 存活探针
///
/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// 创建规则
///
/// POST /api/rules
pub async fn create_rule(
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<Json<ApiResponse<StoredRule>>, ApiError> {
    req.validate()?;

    let rule = state
        .store
        .create(NewRule::new(req.name, req.rule_string))?;

    Ok(Json(ApiResponse::success_with_message(rule, "规则创建成功")))
}

/// 获取全部规则
///
/// GET /api/rules
pub async fn list_rules(State(state): State<AppState>) -> Json<ApiResponse<Vec<StoredRule>>> {
    Json(ApiResponse::success(state.store.list()))
}

/// 获取规则详情
///
/// GET /api/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<StoredRule>>, ApiError> {
    let rule = state.store.get(id)?;
    Ok(Json(ApiResponse::success(rule)))
}

/// 删除规则
///
/// DELETE /api/rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<StoredRule>>, ApiError> {
    let removed = state.store.delete(id)?;
    Ok(Json(ApiResponse::success_with_message(removed, "规则已删除")))
}

/// 编译规则，返回表达式树
///
/// POST /api/rules/compile
pub async fn compile_rule(
    State(state): State<AppState>,
    Json(req): Json<CompileRequest>,
) -> Result<Json<ApiResponse<CompileResponse>>, ApiError> {
    req.validate()?;

    let ast = state.engine.compile(&req.rule_string)?;
    Ok(Json(ApiResponse::success(CompileResponse::from(ast))))
}

/// 对数据记录求值规则集
///
/// POST /api/rules/evaluate
pub async fn evaluate_rules(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<ApiResponse<RuleSetOutcome>>, ApiError> {
    let record = DataRecord::try_from(req.data)?;

    let rules = match req.rule_ids {
        Some(ids) => ids
            .into_iter()
            .map(|id| state.store.get(id))
            .collect::<Result<Vec<_>, _>>()?,
        None => state.store.list(),
    };

    let outcome = state.executor.execute(&rules, &record)?;

    info!(
        rule_count = rules.len(),
        final_result = outcome.final_result,
        "规则集求值请求完成"
    );

    Ok(Json(ApiResponse::success(outcome)))
}
