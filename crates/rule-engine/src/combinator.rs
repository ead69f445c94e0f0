//! 多规则合并
//!
//! 各规则独立编译后按左结合的 AND 链折叠：`((r1 AND r2) AND r3) AND …`。
//! 与单条规则内部向右结合的链式写法形状不同，但 AND 满足结合律，求值结果一致。

use crate::error::ParseError;
use crate::models::Expression;
use crate::parser::Parser;
use crate::tokenizer::tokenize;
use tracing::instrument;

/// 使用指定解析器编译单条规则
pub fn compile_with(parser: &Parser, rule: &str) -> Result<Expression, ParseError> {
    parser.parse(&tokenize(rule))
}

/// 使用指定解析器合并多条规则
///
/// 任意一条规则解析失败时返回 `InvalidRule`，携带原始规则字符串。
#[instrument(level = "debug", skip_all, fields(rules = rules.len()))]
pub fn combine_with<S: AsRef<str>>(parser: &Parser, rules: &[S]) -> Result<Expression, ParseError> {
    let mut compiled = rules.iter().map(|rule| {
        let rule = rule.as_ref();
        compile_with(parser, rule).map_err(|e| ParseError::InvalidRule {
            rule: rule.to_string(),
            source: Box::new(e),
        })
    });

    let first = compiled.next().ok_or(ParseError::EmptyRuleSet)??;

    compiled.try_fold(first, |acc, next| Ok(Expression::and(acc, next?)))
}

/// 使用默认选项合并多条规则
pub fn combine<S: AsRef<str>>(rules: &[S]) -> Result<Expression, ParseError> {
    combine_with(&Parser::default(), rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Comparator;

    fn op(attribute: &str, comparator: Comparator, literal: i32) -> Expression {
        Expression::operand(attribute, comparator, literal)
    }

    #[test]
    fn test_empty_rule_set() {
        let rules: [&str; 0] = [];
        assert_eq!(combine(&rules), Err(ParseError::EmptyRuleSet));
    }

    #[test]
    fn test_single_rule_is_unchanged() {
        assert_eq!(combine(&["age > 30"]).unwrap(), op("age", Comparator::Gt, 30));
    }

    #[test]
    fn test_fold_is_left_leaning() {
        let tree = combine(&["a > 1", "b > 2", "c > 3"]).unwrap();
        assert_eq!(
            tree,
            Expression::and(
                Expression::and(op("a", Comparator::Gt, 1), op("b", Comparator::Gt, 2)),
                op("c", Comparator::Gt, 3),
            )
        );
    }

    #[test]
    fn test_each_rule_parsed_independently() {
        let tree = combine(&["a > 1 OR b > 2", "c > 3"]).unwrap();
        assert_eq!(
            tree,
            Expression::and(
                Expression::or(op("a", Comparator::Gt, 1), op("b", Comparator::Gt, 2)),
                op("c", Comparator::Gt, 3),
            )
        );
    }

    #[test]
    fn test_failure_is_tagged_with_rule() {
        let err = combine(&["age > 30", "(salary < 100", "x = 1"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidRule {
                rule: "(salary < 100".to_string(),
                source: Box::new(ParseError::MismatchedParentheses),
            }
        );
    }

    #[test]
    fn test_accepts_owned_strings() {
        let rules = vec!["a > 1".to_string(), "b > 2".to_string()];
        assert!(combine(&rules).is_ok());
    }
}
