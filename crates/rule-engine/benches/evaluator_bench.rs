//! 条件比较性能基准测试
//!
//! 针对 ConditionEvaluator 的各种比较组合进行细粒度的性能测试。

use criterion::{Criterion, criterion_group, criterion_main};
use rule_engine::Comparator;
use rule_engine::Literal;
use rule_engine::evaluator::ConditionEvaluator;
use serde_json::{Value, json};
use std::hint::black_box;

const COMPARATORS: [(&str, Comparator); 5] = [
    ("gt", Comparator::Gt),
    ("lt", Comparator::Lt),
    ("eq", Comparator::Eq),
    ("gte", Comparator::Gte),
    ("lte", Comparator::Lte),
];

fn bench_comparisons(c: &mut Criterion, name: &str, field: Option<&Value>, literal: &Literal) {
    let mut group = c.benchmark_group(name);

    for (label, comparator) in COMPARATORS.iter() {
        group.bench_function(*label, |b| {
            b.iter(|| {
                ConditionEvaluator::evaluate(
                    black_box(field),
                    black_box(comparator),
                    black_box(literal),
                )
            })
        });
    }

    group.finish();
}

/// 数值比较
fn bench_numeric_operations(c: &mut Criterion) {
    let field = json!(1000);
    bench_comparisons(c, "numeric_operations", Some(&field), &Literal::Number(500.0));
}

/// 字符串比较
fn bench_string_operations(c: &mut Criterion) {
    let field = json!("Sales and Marketing");
    bench_comparisons(
        c,
        "string_operations",
        Some(&field),
        &Literal::from("Sales and Marketing"),
    );
}

/// 类型不匹配与属性缺失
fn bench_mismatched_operations(c: &mut Criterion) {
    let field = json!([1, 2, 3]);
    bench_comparisons(c, "mismatched_operations", Some(&field), &Literal::Number(1.0));
    bench_comparisons(c, "missing_field", None, &Literal::from("x"));
}

/// 未识别的比较符
fn bench_unknown_comparator(c: &mut Criterion) {
    let field = json!(1);
    let comparator = Comparator::Unknown("=>".to_string());
    let literal = Literal::Number(1.0);

    c.bench_function("unknown_comparator", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(Some(&field)),
                black_box(&comparator),
                black_box(&literal),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_numeric_operations,
    bench_string_operations,
    bench_mismatched_operations,
    bench_unknown_comparator,
);

criterion_main!(benches);
