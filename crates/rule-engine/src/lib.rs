//! 资格规则引擎
//!
//! 将文本规则（如 `age > 30 AND department = 'Sales'`）编译为表达式树，
//! 并对 JSON 数据记录求值：
//! - 词法分析与按位置解析，链式条件向右结合，AND/OR 之间没有优先级
//! - 多条规则按左结合的 AND 合并
//! - 不短路的后序求值
//! - 规则存储、规则集执行与 REST API

pub mod combinator;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod http;
pub mod models;
pub mod operators;
pub mod parser;
pub mod store;
pub mod tokenizer;

pub use combinator::combine;
pub use engine::{RuleEngine, compile};
pub use error::{EvalError, ParseError, Result, RuleError};
pub use evaluator::{Evaluation, Evaluator, evaluate};
pub use executor::{IndividualResult, RuleSetExecutor, RuleSetOutcome};
pub use models::{Compound, DataRecord, Expression, Literal, Operand};
pub use operators::{Comparator, Connective};
pub use parser::{Parser, ParserOptions};
pub use store::{InMemoryRuleStore, NewRule, RuleRepository, StoredRule};
pub use tokenizer::{Token, tokenize};
