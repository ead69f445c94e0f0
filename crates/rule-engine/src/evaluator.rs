//! 表达式求值器
//!
//! 对表达式树做后序遍历求值。内部节点总是先求值两棵子树再合并结果（不短路），
//! 未识别的比较符或连接词在这里报错。
//!
//! 比较规则：
//! - 数值 vs 数值：按数值比较；
//! - 字符串 vs 字符串：按字典序比较，`=` 为完全相等；
//! - 其他组合（属性缺失、null、布尔、数组、对象、数值与字符串混用）：任何比较符都为 false。

use crate::error::EvalError;
use crate::models::{Compound, DataRecord, Expression, Literal, Operand};
use crate::operators::{Comparator, Connective};
use serde_json::Value;
use std::cmp::Ordering;

/// 条件比较
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 比较字段值与字面量
    ///
    /// 比较符先于字段值校验，属性缺失时未识别的比较符同样报错。
    pub fn evaluate(
        field_value: Option<&Value>,
        comparator: &Comparator,
        literal: &Literal,
    ) -> Result<bool, EvalError> {
        let accepts: fn(Ordering) -> bool = match comparator {
            Comparator::Gt => |o| o == Ordering::Greater,
            Comparator::Lt => |o| o == Ordering::Less,
            Comparator::Eq => |o| o == Ordering::Equal,
            Comparator::Gte => |o| o != Ordering::Less,
            Comparator::Lte => |o| o != Ordering::Greater,
            Comparator::Unknown(raw) => return Err(EvalError::UnknownOperator(raw.clone())),
        };

        Ok(Self::ordering(field_value, literal).is_some_and(accepts))
    }

    /// 同类型之间的顺序，类型不匹配时为 None
    fn ordering(field_value: Option<&Value>, literal: &Literal) -> Option<Ordering> {
        match (field_value?, literal) {
            (Value::Number(n), Literal::Number(expected)) => n.as_f64()?.partial_cmp(expected),
            (Value::String(s), Literal::String(expected)) => Some(s.as_str().cmp(expected.as_str())),
            _ => None,
        }
    }
}

/// 求值结果
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: bool,
    /// 逐节点追踪（仅在启用追踪时记录）
    pub trace: Vec<String>,
}

/// 表达式求值器
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    /// 是否记录详细求值追踪
    trace_enabled: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用求值追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    /// 对数据记录求值表达式
    ///
    /// 用显式栈做后序遍历，调用栈深度与树高无关；合并上千条规则得到的长链同样适用。
    pub fn evaluate(&self, node: &Expression, record: &DataRecord) -> Result<Evaluation, EvalError> {
        let mut trace = Vec::new();
        let mut pending: Vec<Pending<'_>> = Vec::new();
        let mut node = node;
        let mut path = self.trace_enabled.then(|| "root".to_string());

        loop {
            // 沿左子树下降到叶子
            let mut value = loop {
                match node {
                    Expression::Operand(operand) => {
                        break self.evaluate_operand(operand, record, &mut trace, path.as_deref());
                    }
                    Expression::Compound(compound) => {
                        let left_path = child_path(path.as_deref(), "left");
                        pending.push(Pending {
                            compound,
                            path: path.take(),
                            left: None,
                        });
                        node = &compound.left;
                        path = left_path;
                    }
                }
            };

            // 向上合并，直到遇到右子树尚未访问的节点
            loop {
                let Some(mut frame) = pending.pop() else {
                    let result = value?;
                    return Ok(Evaluation { result, trace });
                };

                match frame.left.take() {
                    None => {
                        let compound = frame.compound;
                        node = &compound.right;
                        path = child_path(frame.path.as_deref(), "right");
                        frame.left = Some(value);
                        pending.push(frame);
                        break;
                    }
                    Some(left) => {
                        value = self.combine(
                            frame.compound,
                            left,
                            value,
                            &mut trace,
                            frame.path.as_deref(),
                        );
                    }
                }
            }
        }
    }

    fn evaluate_operand(
        &self,
        operand: &Operand,
        record: &DataRecord,
        trace: &mut Vec<String>,
        path: Option<&str>,
    ) -> Result<bool, EvalError> {
        let field_value = record.get(&operand.attribute);
        let matched =
            ConditionEvaluator::evaluate(field_value, &operand.comparator, &operand.literal)?;

        if let Some(path) = path {
            trace.push(format!(
                "{}: {} {} {} against {} => {}",
                path,
                operand.attribute,
                operand.comparator,
                operand.literal,
                field_value.map_or_else(|| "undefined".to_string(), Value::to_string),
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        Ok(matched)
    }

    /// 两棵子树都已求值，连接词在此时才校验
    fn combine(
        &self,
        compound: &Compound,
        left: Result<bool, EvalError>,
        right: Result<bool, EvalError>,
        trace: &mut Vec<String>,
        path: Option<&str>,
    ) -> Result<bool, EvalError> {
        let (left, right) = (left?, right?);

        let result = match &compound.connective {
            Connective::And => left && right,
            Connective::Or => left || right,
            Connective::Unknown(raw) => return Err(EvalError::UnknownOperator(raw.clone())),
        };

        if let Some(path) = path {
            trace.push(format!(
                "{}: {} {} {} => {}",
                path, left, compound.connective, right, result
            ));
        }

        Ok(result)
    }
}

/// 已展开但尚未合并的内部节点
struct Pending<'a> {
    compound: &'a Compound,
    /// 追踪路径，未启用追踪时为 None
    path: Option<String>,
    /// 左子树结果；为 None 表示右子树尚未访问
    left: Option<Result<bool, EvalError>>,
}

/// 仅在启用追踪时拼接子节点路径
fn child_path(parent: Option<&str>, side: &str) -> Option<String> {
    parent.map(|parent| format!("{}.{}", parent, side))
}

/// 对数据记录求值表达式（不记录追踪）
pub fn evaluate(node: &Expression, record: &DataRecord) -> Result<bool, EvalError> {
    Evaluator::new().evaluate(node, record).map(|e| e.result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> DataRecord {
        DataRecord::try_from(value).unwrap()
    }

    fn check(field: Option<Value>, comparator: Comparator, literal: impl Into<Literal>) -> bool {
        ConditionEvaluator::evaluate(field.as_ref(), &comparator, &literal.into()).unwrap()
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(check(Some(json!(35)), Comparator::Gt, 30));
        assert!(!check(Some(json!(20)), Comparator::Gt, 30));
        assert!(check(Some(json!(30)), Comparator::Gte, 30));
        assert!(check(Some(json!(29.5)), Comparator::Lt, 30));
        assert!(check(Some(json!(30)), Comparator::Lte, 30));
        assert!(check(Some(json!(30.0)), Comparator::Eq, 30));
        assert!(!check(Some(json!(31)), Comparator::Eq, 30));
    }

    #[test]
    fn test_string_comparisons() {
        assert!(check(Some(json!("Sales")), Comparator::Eq, "Sales"));
        assert!(!check(Some(json!("sales")), Comparator::Eq, "Sales"));
        assert!(check(Some(json!("b")), Comparator::Gt, "a"));
        assert!(check(Some(json!("apple")), Comparator::Lt, "banana"));
        assert!(check(Some(json!("x")), Comparator::Gte, "x"));
    }

    #[test]
    fn test_mismatched_types_are_false() {
        for comparator in [
            Comparator::Gt,
            Comparator::Lt,
            Comparator::Eq,
            Comparator::Gte,
            Comparator::Lte,
        ] {
            assert!(!check(None, comparator.clone(), 30));
            assert!(!check(Some(json!(null)), comparator.clone(), 0));
            assert!(!check(Some(json!("35")), comparator.clone(), 30));
            assert!(!check(Some(json!(35)), comparator.clone(), "35"));
            assert!(!check(Some(json!(true)), comparator.clone(), "true"));
            assert!(!check(Some(json!([1, 2])), comparator.clone(), 1));
            assert!(!check(Some(json!({"a": 1})), comparator.clone(), "a"));
        }
    }

    #[test]
    fn test_unknown_comparator_fails_even_when_attribute_missing() {
        let err = ConditionEvaluator::evaluate(
            None,
            &Comparator::Unknown("=>".to_string()),
            &Literal::Number(1.0),
        )
        .unwrap_err();
        assert_eq!(err, EvalError::UnknownOperator("=>".to_string()));
    }

    #[test]
    fn test_connectives() {
        let data = record(json!({"a": 1, "b": 2}));
        let t = Expression::operand("a", Comparator::Eq, 1);
        let f = Expression::operand("b", Comparator::Eq, 1);

        assert!(evaluate(&Expression::and(t.clone(), t.clone()), &data).unwrap());
        assert!(!evaluate(&Expression::and(t.clone(), f.clone()), &data).unwrap());
        assert!(evaluate(&Expression::or(f.clone(), t.clone()), &data).unwrap());
        assert!(!evaluate(&Expression::or(f.clone(), f.clone()), &data).unwrap());
    }

    #[test]
    fn test_unknown_connective() {
        let data = record(json!({"a": 1}));
        let tree = Expression::compound(
            Connective::Unknown("XOR".to_string()),
            Expression::operand("a", Comparator::Eq, 1),
            Expression::operand("a", Comparator::Eq, 1),
        );
        assert_eq!(
            evaluate(&tree, &data),
            Err(EvalError::UnknownOperator("XOR".to_string()))
        );
    }

    #[test]
    fn test_no_short_circuit() {
        // 左子树为 false 已能决定 AND 的结果，右子树仍被求值并暴露出无效比较符
        let data = record(json!({"age": 20}));
        let tree = Expression::and(
            Expression::operand("age", Comparator::Gt, 30),
            Expression::operand("missing", Comparator::Unknown("<>".to_string()), 1),
        );
        assert_eq!(
            evaluate(&tree, &data),
            Err(EvalError::UnknownOperator("<>".to_string()))
        );

        // OR 左侧为 true 时同样如此
        let tree = Expression::or(
            Expression::operand("age", Comparator::Lt, 30),
            Expression::operand("missing", Comparator::Unknown("<>".to_string()), 1),
        );
        assert!(evaluate(&tree, &data).is_err());
    }

    #[test]
    fn test_trace_visits_both_children() {
        let data = record(json!({"age": 20}));
        let tree = Expression::and(
            Expression::operand("age", Comparator::Gt, 30),
            Expression::operand("department", Comparator::Eq, "Sales"),
        );

        let evaluation = Evaluator::new().with_trace().evaluate(&tree, &data).unwrap();

        assert!(!evaluation.result);
        assert_eq!(
            evaluation.trace,
            vec![
                "root.left: age > 30 against 20 => NOT_MATCHED".to_string(),
                "root.right: department = 'Sales' against undefined => NOT_MATCHED".to_string(),
                "root: false AND false => false".to_string(),
            ]
        );
    }

    #[test]
    fn test_trace_disabled_by_default() {
        let data = record(json!({"age": 35}));
        let tree = Expression::operand("age", Comparator::Gt, 30);
        let evaluation = Evaluator::new().evaluate(&tree, &data).unwrap();
        assert!(evaluation.result);
        assert!(evaluation.trace.is_empty());
    }

    fn and_chain(len: usize) -> Expression {
        (1..len).fold(Expression::operand("a", Comparator::Gt, 1), |acc, _| {
            Expression::and(acc, Expression::operand("a", Comparator::Gt, 1))
        })
    }

    #[test]
    fn test_deep_chain_without_trace() {
        let data = record(json!({"a": 2}));
        let tree = and_chain(20_000);

        let evaluation = Evaluator::new().evaluate(&tree, &data).unwrap();

        assert!(evaluation.result);
        assert!(evaluation.trace.is_empty());
        assert!(!evaluate(&tree, &record(json!({"a": 1}))).unwrap());
    }

    #[test]
    fn test_trace_paths_follow_nesting() {
        let data = record(json!({"a": 2}));
        let tree = and_chain(3);

        let trace = Evaluator::new().with_trace().evaluate(&tree, &data).unwrap().trace;

        assert_eq!(
            trace,
            vec![
                "root.left.left: a > 1 against 2 => MATCHED".to_string(),
                "root.left.right: a > 1 against 2 => MATCHED".to_string(),
                "root.left: true AND true => true".to_string(),
                "root.right: a > 1 against 2 => MATCHED".to_string(),
                "root: true AND true => true".to_string(),
            ]
        );
    }

    #[test]
    fn test_left_error_wins_after_both_sides_evaluated() {
        let data = record(json!({"a": 1}));
        let tree = Expression::or(
            Expression::operand("a", Comparator::Unknown("=<".to_string()), 1),
            Expression::operand("a", Comparator::Unknown("<>".to_string()), 1),
        );
        assert_eq!(
            evaluate(&tree, &data),
            Err(EvalError::UnknownOperator("=<".to_string()))
        );
    }

    #[test]
    fn test_repeated_evaluation_is_pure() {
        let data = record(json!({"age": 35, "department": "Sales"}));
        let tree = Expression::and(
            Expression::operand("age", Comparator::Gt, 30),
            Expression::operand("department", Comparator::Eq, "Sales"),
        );

        let first = evaluate(&tree, &data).unwrap();
        let second = evaluate(&tree, &data).unwrap();
        assert_eq!(first, second);
        assert!(first);
    }
}
