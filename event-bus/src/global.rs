//! 进程级默认总线
//!
//! 便捷入口：首次使用时创建一个共享的 [`EventBus`]。
//! 需要隔离（例如测试）时请直接构造 [`EventBus`] 实例。
//!
use crate::bus::EventBus;
use crate::error::BusResult;
use crate::event::{Event, Payload};
use crate::options::EmitOptions;
use crate::registry::HandlerMap;
use std::sync::OnceLock;

static DEFAULT_BUS: OnceLock<EventBus> = OnceLock::new();

/// 默认总线实例
pub fn bus() -> &'static EventBus {
    DEFAULT_BUS.get_or_init(EventBus::new)
}

pub fn replace_handlers(map: HandlerMap) {
    bus().replace_handlers(map);
}

pub async fn emit(event: &Event, payload: Payload, options: Option<EmitOptions>) -> BusResult<()> {
    bus().emit(event, payload, options).await
}

pub async fn emit_after<F>(event: &Event, options: Option<EmitOptions>, action: F) -> BusResult<()>
where
    F: FnOnce(),
{
    bus().emit_after(event, options, action).await
}
