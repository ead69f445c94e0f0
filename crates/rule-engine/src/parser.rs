//! 规则表达式解析器
//!
//! 按位置消费词法单元的递归下降解析：
//! - 以 `(` 开头时，解析到匹配的 `)` 为止作为左子树，其后若还有内容，
//!   下一个词作为连接词，剩余部分递归解析为右子树；
//! - 否则前三个词依次为 属性、比较符、值，其后同样是 连接词 + 右子树。
//!
//! 因此多个条件的链式写法总是向右结合，AND 与 OR 之间没有优先级：
//! `A AND B OR C` 解析为 `A AND (B OR C)`。

use crate::error::ParseError;
use crate::models::{Expression, Literal, Operand};
use crate::operators::{Comparator, Connective};
use crate::tokenizer::Token;

/// 默认解析递归深度上限
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// 解析选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// 在解析阶段拒绝未识别的比较符与连接词
    pub strict_operators: bool,
    /// 递归深度上限（括号嵌套与链式条件都会增加深度）
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strict_operators: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// 规则解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// 将词法单元序列解析为表达式树
    pub fn parse(&self, tokens: &[Token<'_>]) -> Result<Expression, ParseError> {
        self.parse_expression(tokens, 1)
    }

    fn parse_expression(&self, tokens: &[Token<'_>], depth: usize) -> Result<Expression, ParseError> {
        if depth > self.options.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.options.max_depth,
            });
        }

        let Some(first) = tokens.first() else {
            return Err(ParseError::EmptyInput);
        };

        if *first == Token::LParen {
            let closing = find_closing_parenthesis(tokens)?;
            let inner = self.parse_expression(&tokens[1..closing], depth + 1)?;

            // 整个序列被一对括号包裹
            if closing == tokens.len() - 1 {
                return Ok(inner);
            }

            let connective = self.connective(&tokens[closing + 1])?;
            let right = self.parse_expression(&tokens[closing + 2..], depth + 1)?;
            return Ok(Expression::compound(connective, inner, right));
        }

        if tokens.len() < 3 {
            return Err(ParseError::MalformedOperand {
                remaining: tokens.len(),
            });
        }

        let operand = Expression::Operand(self.operand(&tokens[..3])?);

        if tokens.len() == 3 {
            return Ok(operand);
        }

        let connective = self.connective(&tokens[3])?;
        let right = self.parse_expression(&tokens[4..], depth + 1)?;
        Ok(Expression::compound(connective, operand, right))
    }

    /// 按位置读取 属性 比较符 值
    fn operand(&self, tokens: &[Token<'_>]) -> Result<Operand, ParseError> {
        let comparator = Comparator::from_symbol(tokens[1].as_str());
        if self.options.strict_operators && !comparator.is_known() {
            return Err(ParseError::UnknownOperator(comparator.to_string()));
        }

        Ok(Operand {
            attribute: tokens[0].as_str().to_string(),
            comparator,
            literal: parse_literal(&tokens[2]),
        })
    }

    fn connective(&self, token: &Token<'_>) -> Result<Connective, ParseError> {
        let connective = Connective::from_keyword(token.as_str());
        if self.options.strict_operators && !connective.is_known() {
            return Err(ParseError::UnknownOperator(connective.to_string()));
        }
        Ok(connective)
    }
}

/// 使用默认选项解析
pub fn parse(tokens: &[Token<'_>]) -> Result<Expression, ParseError> {
    Parser::default().parse(tokens)
}

/// 查找与首个 `(` 匹配的 `)` 的下标
fn find_closing_parenthesis(tokens: &[Token<'_>]) -> Result<usize, ParseError> {
    let mut depth = 1usize;
    for (i, token) in tokens.iter().enumerate().skip(1) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::MismatchedParentheses)
}

/// 解析字面量：能读作有限十进制数的裸词为数值，其余为字符串（去掉两侧单引号）
fn parse_literal(token: &Token<'_>) -> Literal {
    match token {
        Token::Word(raw) => parse_number(raw)
            .map(Literal::Number)
            .unwrap_or_else(|| Literal::String(raw.to_string())),
        Token::Quoted(raw) => {
            let inner = raw
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .unwrap_or(raw);
            Literal::String(inner.to_string())
        }
        other => Literal::String(other.as_str().to_string()),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    // f64 的 FromStr 还接受 "inf"、"NaN" 之类的写法，这里只认以数字开头的文本
    if !raw.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}
