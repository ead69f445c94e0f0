//! 规则引擎入口
//!
//! `RuleEngine` 携带解析选项与追踪开关，服务层持有一个实例；
//! 同名的自由函数使用默认选项。

use crate::combinator::{combine_with, compile_with};
use crate::error::{EvalError, ParseError};
use crate::evaluator::{Evaluation, Evaluator};
use crate::models::{DataRecord, Expression};
use crate::parser::{Parser, ParserOptions};
use eligibility_shared::config::EngineConfig;

/// 配置化的规则引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    parser: Parser,
    evaluator: Evaluator,
}

impl RuleEngine {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            parser: Parser::new(options),
            evaluator: Evaluator::new(),
        }
    }

    /// 根据服务配置创建
    pub fn from_config(config: &EngineConfig) -> Self {
        let engine = Self::new(ParserOptions {
            strict_operators: config.strict_operators,
            max_depth: config.max_depth,
        });

        if config.trace_enabled {
            engine.with_trace()
        } else {
            engine
        }
    }

    /// 启用求值追踪
    pub fn with_trace(mut self) -> Self {
        self.evaluator = self.evaluator.with_trace();
        self
    }

    pub fn options(&self) -> ParserOptions {
        self.parser.options()
    }

    pub fn trace_enabled(&self) -> bool {
        self.evaluator.trace_enabled()
    }

    /// 编译单条规则
    pub fn compile(&self, rule: &str) -> Result<Expression, ParseError> {
        compile_with(&self.parser, rule)
    }

    /// 合并多条规则
    pub fn combine<S: AsRef<str>>(&self, rules: &[S]) -> Result<Expression, ParseError> {
        combine_with(&self.parser, rules)
    }

    /// 求值表达式
    pub fn evaluate(&self, node: &Expression, record: &DataRecord) -> Result<Evaluation, EvalError> {
        self.evaluator.evaluate(node, record)
    }
}

/// 使用默认选项编译单条规则
pub fn compile(rule: &str) -> Result<Expression, ParseError> {
    RuleEngine::default().compile(rule)
}
