//! 规则集执行器
//!
//! 对一组已存储规则求值：全部规则合并后的结果作为最终结果，
//! 同时逐条独立编译求值，给出每条规则各自的结果。

use crate::engine::RuleEngine;
use crate::error::{ParseError, Result};
use crate::models::DataRecord;
use crate::store::StoredRule;
use eligibility_shared::observability::metrics;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// 单条规则的求值结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualResult {
    pub rule_id: u64,
    pub rule: String,
    pub result: bool,
}

/// 规则集求值结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetOutcome {
    /// 全部规则 AND 合并后的结果
    pub final_result: bool,
    pub individual_results: Vec<IndividualResult>,
    /// 求值耗时（微秒）
    pub evaluation_time_us: u64,
    /// 合并树的求值追踪（启用追踪时）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

/// 规则集执行器
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSetExecutor {
    engine: RuleEngine,
}

impl RuleSetExecutor {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    /// 执行规则集求值
    #[instrument(skip(self, rules, record), fields(rule_count = rules.len()))]
    pub fn execute(&self, rules: &[StoredRule], record: &DataRecord) -> Result<RuleSetOutcome> {
        if rules.is_empty() {
            return Err(ParseError::EmptyRuleSet.into());
        }

        let start = Instant::now();

        let rule_strings: Vec<&str> = rules.iter().map(|r| r.rule_string.as_str()).collect();
        let combined = self.engine.combine(&rule_strings)?;
        let evaluation = self.engine.evaluate(&combined, record)?;

        let individual_results = rules
            .iter()
            .map(|rule| -> Result<IndividualResult> {
                let tree = self.engine.compile(&rule.rule_string)?;
                let result = self.engine.evaluate(&tree, record)?.result;
                debug!(rule_id = rule.id, result, "单条规则求值完成");
                Ok(IndividualResult {
                    rule_id: rule.id,
                    rule: rule.rule_string.clone(),
                    result,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let elapsed = start.elapsed();
        metrics::record_rule_evaluation(evaluation.result, rules.len(), elapsed.as_secs_f64());

        info!(
            final_result = evaluation.result,
            evaluation_time_us = elapsed.as_micros() as u64,
            "规则集求值完成"
        );

        Ok(RuleSetOutcome {
            final_result: evaluation.result,
            individual_results,
            evaluation_time_us: elapsed.as_micros() as u64,
            trace: evaluation.trace,
        })
    }
}
