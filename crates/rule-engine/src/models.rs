//! 规则引擎领域模型
//!
//! 规则字符串编译后得到一棵严格二叉的表达式树：叶子是 `Operand`（属性 比较符 值），
//! 内部节点是 `Compound`（连接词 + 左右子树）。树在构建后不可变。

use crate::error::RuleError;
use crate::operators::{Comparator, Connective};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// 整数形式输出的上限（超过后 f64 无法精确表示整数）
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// 规则中的字面量
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

impl Literal {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::String(s) => Some(s),
        }
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // 整数值按整数输出，与 JSON 数据记录中的写法保持一致
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            String(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::Number(n),
            Raw::String(s) => Self::String(s),
        })
    }
}

/// 表达式节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    Operand(Operand),
    #[serde(rename = "operator")]
    Compound(Compound),
}

/// 叶子节点：单个比较条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub attribute: String,
    #[serde(rename = "operator")]
    pub comparator: Comparator,
    #[serde(rename = "value")]
    pub literal: Literal,
}

impl Operand {
    pub fn new(
        attribute: impl Into<String>,
        comparator: Comparator,
        literal: impl Into<Literal>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            comparator,
            literal: literal.into(),
        }
    }
}

/// 内部节点：连接词与两棵子树
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    #[serde(rename = "operator")]
    pub connective: Connective,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl Compound {
    pub fn new(connective: Connective, left: Expression, right: Expression) -> Self {
        Self {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Expression {
    /// 构建叶子节点
    pub fn operand(
        attribute: impl Into<String>,
        comparator: Comparator,
        literal: impl Into<Literal>,
    ) -> Self {
        Self::Operand(Operand::new(attribute, comparator, literal))
    }

    /// 构建内部节点
    pub fn compound(connective: Connective, left: Expression, right: Expression) -> Self {
        Self::Compound(Compound::new(connective, left, right))
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::compound(Connective::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::compound(Connective::Or, left, right)
    }

    /// 表达式中引用的全部属性名
    pub fn attributes(&self) -> BTreeSet<&str> {
        self.nodes()
            .filter_map(|node| match node {
                Self::Operand(operand) => Some(operand.attribute.as_str()),
                Self::Compound(_) => None,
            })
            .collect()
    }

    /// 叶子节点数量
    pub fn operand_count(&self) -> usize {
        self.nodes()
            .filter(|node| matches!(node, Self::Operand(_)))
            .count()
    }

    /// 树高（单个叶子为 1）
    pub fn depth(&self) -> usize {
        let mut stack = vec![(self, 1usize)];
        let mut depth = 0;
        while let Some((node, level)) = stack.pop() {
            depth = depth.max(level);
            if let Self::Compound(compound) = node {
                stack.push((compound.right.as_ref(), level + 1));
                stack.push((compound.left.as_ref(), level + 1));
            }
        }
        depth
    }

    /// 先序遍历全部节点
    fn nodes(&self) -> impl Iterator<Item = &Expression> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Self::Compound(compound) = node {
                stack.push(compound.right.as_ref());
                stack.push(compound.left.as_ref());
            }
            Some(node)
        })
    }

    /// 不占用堆内存的占位叶子，用于拆树
    fn placeholder() -> Self {
        Self::Operand(Operand {
            attribute: String::new(),
            comparator: Comparator::Eq,
            literal: Literal::Number(0.0),
        })
    }
}

/// 逐层拆开子树再释放，避免合并大量规则后的长链在析构时递归过深
impl Drop for Expression {
    fn drop(&mut self) {
        let Self::Compound(compound) = self else {
            return;
        };

        let mut stack = vec![take_child(&mut compound.left), take_child(&mut compound.right)];
        while let Some(mut node) = stack.pop() {
            if let Self::Compound(compound) = &mut node {
                stack.push(take_child(&mut compound.left));
                stack.push(take_child(&mut compound.right));
            }
        }
    }
}

fn take_child(slot: &mut Box<Expression>) -> Expression {
    std::mem::replace(slot.as_mut(), Expression::placeholder())
}

/// 渲染回规则字符串；内部节点作为子树时加括号，重新编译可得到同形的树
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operand(operand) => write!(
                f,
                "{} {} {}",
                operand.attribute, operand.comparator, operand.literal
            ),
            Self::Compound(compound) => {
                write_child(f, &compound.left)?;
                write!(f, " {} ", compound.connective)?;
                write_child(f, &compound.right)
            }
        }
    }
}

fn write_child(f: &mut fmt::Formatter<'_>, child: &Expression) -> fmt::Result {
    match child {
        Expression::Operand(_) => write!(f, "{}", child),
        Expression::Compound(_) => write!(f, "({})", child),
    }
}

/// 数据记录 - 规则求值时的输入数据（属性名 -> 值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRecord {
    fields: Map<String, Value>,
}

impl DataRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// 从 JSON 对象字符串创建
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// 获取属性值，不存在时返回 None
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.fields.get(attribute)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 获取底层数据
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for DataRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

impl TryFrom<Value> for DataRecord {
    type Error = RuleError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RuleError::Validation(format!(
                "数据记录必须是 JSON 对象，实际为 {}",
                json_type_name(&other)
            ))),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for DataRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// 获取 JSON 值的类型名称
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
