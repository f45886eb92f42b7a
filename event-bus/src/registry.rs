//! 处理器注册表（HandlerRegistry）
//!
//! 维护 事件 → 有序处理器列表 的映射：
//! - 只支持整表替换，读者不会观察到半更新的映射；
//! - 读写锁保护一个 `Arc<HandlerMap>`，查找时仅克隆对应列表中的 `Arc`。
//!
use crate::event::Event;
use crate::handler::HandlerRef;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// 事件到处理器列表的映射，列表顺序即分发（启动）顺序
pub type HandlerMap = HashMap<Event, Vec<HandlerRef>>;

#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<Arc<HandlerMap>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以新映射整体替换当前映射
    pub fn replace_all(&self, map: HandlerMap) {
        let map = Arc::new(map);
        // 锁内只做指针交换；旧映射在锁外释放
        let _old = {
            let mut guard = self.inner.write().unwrap_or_else(|poisoned| {
                tracing::warn!("handler registry lock was poisoned, recovering");
                PoisonError::into_inner(poisoned)
            });
            std::mem::replace(&mut *guard, map)
        };
    }

    /// 查找事件对应的处理器列表
    ///
    /// - `None`：从未注册该事件；
    /// - `Some(vec![])`：显式注册了空列表。
    pub fn lookup(&self, event: &Event) -> Option<Vec<HandlerRef>> {
        self.snapshot().get(event).cloned()
    }

    /// 当前映射的一致性快照
    pub fn snapshot(&self) -> Arc<HandlerMap> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// 已注册的事件列表（只读视图）
    pub fn events(&self) -> Vec<Event> {
        self.snapshot().keys().cloned().collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        let mut map = f.debug_map();
        for (event, handlers) in snapshot.iter() {
            let names: Vec<&str> = handlers.iter().map(|h| h.handler_name()).collect();
            map.entry(&event.as_str(), &names);
        }
        map.finish()
    }
}
