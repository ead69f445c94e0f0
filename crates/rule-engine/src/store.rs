//! 规则存储管理
//!
//! 存储的是经过校验的规则字符串，而不是编译结果：创建时编译一次用于校验，
//! 求值时再按需重新编译。`InMemoryRuleStore` 使用 DashMap 提供线程安全的存储。

use crate::engine::RuleEngine;
use crate::error::{Result, RuleError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use eligibility_shared::observability::metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument, warn};

/// 待创建的规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub name: String,
    pub rule_string: String,
}

impl NewRule {
    pub fn new(name: impl Into<String>, rule_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_string: rule_string.into(),
        }
    }
}

/// 已存储的规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRule {
    pub id: u64,
    pub name: String,
    pub rule_string: String,
    pub created_at: DateTime<Utc>,
}

/// 规则仓储接口
#[cfg_attr(test, mockall::automock)]
pub trait RuleRepository: Send + Sync {
    /// 校验并保存规则
    fn create(&self, rule: NewRule) -> Result<StoredRule>;

    /// 按 ID 升序列出全部规则
    fn list(&self) -> Vec<StoredRule>;

    fn get(&self, id: u64) -> Result<StoredRule>;

    /// 删除规则，返回被删除的记录
    fn delete(&self, id: u64) -> Result<StoredRule>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 内存规则存储
#[derive(Clone)]
pub struct InMemoryRuleStore {
    rules: Arc<DashMap<u64, StoredRule>>,
    /// ID 只增不减，删除后不会复用
    next_id: Arc<AtomicU64>,
    engine: RuleEngine,
}

impl InMemoryRuleStore {
    /// 使用指定引擎校验规则
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            engine,
        }
    }

    fn validate(&self, rule: &NewRule) -> Result<()> {
        if rule.name.trim().is_empty() {
            return Err(RuleError::Validation("规则名称不能为空".to_string()));
        }
        if rule.rule_string.trim().is_empty() {
            return Err(RuleError::Validation("规则字符串不能为空".to_string()));
        }

        // 编译结果只用于校验，不做缓存
        self.engine.compile(&rule.rule_string).map_err(|e| {
            metrics::record_compile_failure(e.code());
            RuleError::from(e)
        })?;

        Ok(())
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new(RuleEngine::default())
    }
}

impl RuleRepository for InMemoryRuleStore {
    #[instrument(skip(self, rule), fields(rule_name = %rule.name))]
    fn create(&self, rule: NewRule) -> Result<StoredRule> {
        if let Err(e) = self.validate(&rule) {
            warn!(error = %e, "规则校验失败");
            return Err(e);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = StoredRule {
            id,
            name: rule.name,
            rule_string: rule.rule_string,
            created_at: Utc::now(),
        };

        self.rules.insert(id, stored.clone());
        metrics::set_rules_stored(self.rules.len());

        info!(rule_id = id, "规则已创建");
        Ok(stored)
    }

    fn list(&self) -> Vec<StoredRule> {
        let mut rules: Vec<StoredRule> = self.rules.iter().map(|r| r.value().clone()).collect();
        rules.sort_by_key(|r| r.id);
        rules
    }

    fn get(&self, id: u64) -> Result<StoredRule> {
        self.rules
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(RuleError::RuleNotFound(id))
    }

    #[instrument(skip(self))]
    fn delete(&self, id: u64) -> Result<StoredRule> {
        match self.rules.remove(&id) {
            Some((_, removed)) => {
                metrics::set_rules_stored(self.rules.len());
                info!("规则已删除: {}", id);
                Ok(removed)
            }
            None => {
                warn!("删除不存在的规则: {}", id);
                Err(RuleError::RuleNotFound(id))
            }
        }
    }

    fn len(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::parser::ParserOptions;

    #[test]
    fn test_create_rule() {
        let store = InMemoryRuleStore::default();

        let rule = store
            .create(NewRule::new("senior", "age > 30 AND department = 'Sales'"))
            .unwrap();

        assert_eq!(rule.id, 1);
        assert_eq!(rule.name, "senior");
        assert_eq!(rule.rule_string, "age > 30 AND department = 'Sales'");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_rejects_empty_fields() {
        let store = InMemoryRuleStore::default();

        let err = store.create(NewRule::new("  ", "age > 30")).unwrap_err();
        assert!(matches!(err, RuleError::Validation(_)));

        let err = store.create(NewRule::new("senior", "")).unwrap_err();
        assert!(matches!(err, RuleError::Validation(_)));

        assert!(store.is_empty());
    }

    #[test]
    fn test_create_rejects_invalid_rule_string() {
        let store = InMemoryRuleStore::default();

        let err = store.create(NewRule::new("broken", "(age > 30")).unwrap_err();
        assert!(matches!(
            err,
            RuleError::Parse(ParseError::MismatchedParentheses)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_lazy_store_accepts_unknown_operators() {
        let store = InMemoryRuleStore::default();
        assert!(store.create(NewRule::new("lazy", "a <> 1")).is_ok());

        let strict = InMemoryRuleStore::new(RuleEngine::new(ParserOptions {
            strict_operators: true,
            ..Default::default()
        }));
        let err = strict.create(NewRule::new("strict", "a <> 1")).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_OPERATOR");
    }

    #[test]
    fn test_get_and_delete() {
        let store = InMemoryRuleStore::default();
        let rule = store.create(NewRule::new("adult", "age >= 18")).unwrap();

        assert_eq!(store.get(rule.id).unwrap(), rule);

        let removed = store.delete(rule.id).unwrap();
        assert_eq!(removed.id, rule.id);
        assert!(matches!(store.get(rule.id), Err(RuleError::RuleNotFound(1))));
        assert!(matches!(store.delete(rule.id), Err(RuleError::RuleNotFound(1))));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let store = InMemoryRuleStore::default();
        let first = store.create(NewRule::new("a", "a > 1")).unwrap();
        let second = store.create(NewRule::new("b", "b > 1")).unwrap();
        store.delete(second.id).unwrap();

        let third = store.create(NewRule::new("c", "c > 1")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(third.id, 3);
        assert_eq!(
            store.list().iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_stored_rule_serialization() {
        let store = InMemoryRuleStore::default();
        let rule = store.create(NewRule::new("adult", "age >= 18")).unwrap();

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["ruleString"], "age >= 18");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = InMemoryRuleStore::default();
        let store_clone = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                store_clone
                    .create(NewRule::new(format!("rule-{}", i), format!("x > {}", i)))
                    .unwrap();
            }
        });

        for i in 100..200 {
            store
                .create(NewRule::new(format!("rule-{}", i), format!("x > {}", i)))
                .unwrap();
        }

        handle.join().unwrap();

        let ids: Vec<u64> = store.list().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
    }
}
