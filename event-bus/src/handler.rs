//! 事件处理器（EventHandler）
//!
//! 处理器以显式名称注册，名称用于失败聚合与日志定位；
//! 负载形状由处理器自行校验，不符合预期时返回 [`InvalidArgError`](crate::error::InvalidArgError)。
//!
use crate::event::Payload;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 处理器引用：注册表中保存的共享处理器
pub type HandlerRef = Arc<dyn EventHandler>;

/// 事件处理器：处理某一事件的负载
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于失败聚合与日志）
    fn handler_name(&self) -> &str;

    /// 处理负载；并发模式下同一负载会被多个处理器同时持有
    async fn handle(&self, payload: Arc<Payload>) -> anyhow::Result<()>;
}

/// 基于闭包的处理器，见 [`handler_fn`]
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(Arc<Payload>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, payload: Arc<Payload>) -> anyhow::Result<()> {
        (self.f)(payload).await
    }
}

/// 将异步闭包包装为带名称的处理器
///
/// ```rust
/// use event_bus::handler_fn;
///
/// let welcome = handler_fn("send_welcome_email", |payload| async move {
///     let _email = payload.get("email");
///     Ok(())
/// });
/// # let _ = welcome;
/// ```
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> HandlerRef
where
    F: Fn(Arc<Payload>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}
