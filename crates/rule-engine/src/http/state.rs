//! 应用状态定义

use crate::engine::RuleEngine;
use crate::executor::RuleSetExecutor;
use crate::store::{InMemoryRuleStore, RuleRepository};
use std::sync::Arc;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RuleRepository>,
    pub engine: RuleEngine,
    pub executor: RuleSetExecutor,
}

impl AppState {
    pub fn new(store: Arc<dyn RuleRepository>, engine: RuleEngine) -> Self {
        Self {
            store,
            engine,
            executor: RuleSetExecutor::new(engine),
        }
    }

    /// 使用内存存储创建
    pub fn in_memory(engine: RuleEngine) -> Self {
        Self::new(Arc::new(InMemoryRuleStore::new(engine)), engine)
    }
}
