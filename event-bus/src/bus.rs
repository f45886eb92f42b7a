//! 事件总线（EventBus）
//!
//! 根据事件查找处理器列表并按注册顺序启动：
//! - `concurrent = true`：每个处理器运行在独立的 tokio 任务中；
//! - `concurrent = false`：在调用方上下文中逐个 `.await`；
//! - `wait = true`：返回前等待全部处理器结束。
//!
//! 每个处理器的失败都带上处理器名称写入一个容量等于处理器数量的失败通道，
//! 上报方永远不会因通道已满而阻塞；返回前收集通道中的全部失败组成聚合错误。
//!
//! 未等待的并发发射（fire-and-forget）中，`emit` 返回时仍在运行的处理器，
//! 其失败无法再进入返回值。这类迟到的失败由后台任务以 `warn` 级别记录，
//! 见 [`EventBusConfig::report_detached_failures`]；记录与丢弃的条数见
//! [`EventBus::detached_failures`]。
//!
//! 并发任务一经启动即与 `emit` 脱离：调用方放弃等待（例如外层超时）时，
//! 已启动的处理器照常运行到结束。
//!
use crate::error::{AggregateError, BusError, BusResult, HandlerFailure, HandlerPanic};
use crate::event::{Event, Payload};
use crate::handler::HandlerRef;
use crate::options::{EmitOptions, EventBusConfig};
use crate::registry::{HandlerMap, HandlerRegistry};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// `emit` 返回后才到达的失败计数
#[derive(Debug, Default)]
pub struct DetachedFailureStats {
    reported: AtomicUsize,
    dropped: AtomicUsize,
}

impl DetachedFailureStats {
    /// 由后台任务记录到日志的失败条数
    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::Acquire)
    }

    /// 因上报关闭（或调用方放弃等待）而丢弃的失败条数
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Acquire)
    }
}

/// 进程内事件总线
///
/// 可独立构造多个实例（例如测试隔离）；需要全局实例时见 [`crate::global`]。
#[derive(Debug, Default)]
pub struct EventBus {
    registry: HandlerRegistry,
    config: EventBusConfig,
    detached: Arc<DetachedFailureStats>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            registry: HandlerRegistry::new(),
            config,
            detached: Arc::default(),
        }
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn detached_failures(&self) -> &DetachedFailureStats {
        &self.detached
    }

    /// 整体替换 事件 → 处理器列表 映射
    ///
    /// ```rust
    /// use event_bus::{Event, EventBus, HandlerMap, handler_fn};
    ///
    /// const USER_SIGNED_UP: Event = Event::from_static("user-signed-up");
    ///
    /// let bus = EventBus::new();
    /// bus.replace_handlers(HandlerMap::from([(
    ///     USER_SIGNED_UP,
    ///     vec![
    ///         handler_fn("send_welcome_email", |_| async { Ok(()) }),
    ///         handler_fn("send_verification_email", |_| async { Ok(()) }),
    ///     ],
    /// )]));
    /// assert_eq!(bus.registry().events(), vec![Event::from("user-signed-up")]);
    /// ```
    pub fn replace_handlers(&self, map: HandlerMap) {
        self.registry.replace_all(map);
    }

    /// 发射事件
    ///
    /// - 事件未注册：立即返回 [`BusError::HandlersNotFound`]，不执行任何处理器；
    /// - 事件注册了空列表：成功返回；
    /// - `options` 为 `None` 时使用配置中的默认选项（默认并发、不等待）；
    /// - 任一处理器失败不会中断其余处理器；全部失败聚合为 [`BusError::Handlers`]。
    pub async fn emit(
        &self,
        event: &Event,
        payload: Payload,
        options: Option<EmitOptions>,
    ) -> BusResult<()> {
        let Some(handlers) = self.registry.lookup(event) else {
            return Err(BusError::HandlersNotFound {
                event: event.clone(),
            });
        };

        let opts = options.unwrap_or(self.config.default_options);

        if handlers.is_empty() {
            tracing::debug!(event = %event, "no handlers bound, nothing to emit");
            return Ok(());
        }

        tracing::debug!(
            event = %event,
            handlers = handlers.len(),
            concurrent = opts.concurrent,
            wait = opts.wait,
            "emitting event"
        );

        let payload = Arc::new(payload);
        let (tx, mut rx) = mpsc::channel::<HandlerFailure>(handlers.len());
        let mut pending: Vec<JoinHandle<()>> = Vec::new();

        for handler in handlers {
            let task = run_handler(
                handler,
                Arc::clone(&payload),
                tx.clone(),
                Arc::clone(&self.detached),
            );

            if opts.concurrent {
                let join = tokio::spawn(task);
                if opts.wait {
                    pending.push(join);
                }
            } else {
                task.await;
            }
        }
        drop(tx);

        // 丢弃 JoinHandle 只会分离任务，emit 被取消时处理器不受影响
        for join in pending {
            // run_handler 自行捕获 panic，这里只会遇到任务被取消（运行时关闭）
            if let Err(e) = join.await {
                tracing::warn!(event = %event, error = %e, "handler task did not complete");
            }
        }

        let mut failures = AggregateError::default();
        while let Ok(failure) = rx.try_recv() {
            failures.push(failure);
        }

        if opts.concurrent && !opts.wait && self.config.report_detached_failures {
            spawn_detached_reporter(event.clone(), rx, Arc::clone(&self.detached));
        }

        tracing::debug!(event = %event, failures = failures.len(), "emission finished");

        failures.into_result().map_err(BusError::from)
    }

    /// 先执行 `action`，再以空负载发射 `event`
    ///
    /// `action` 自身没有失败通道；返回值仅反映发射结果。
    pub async fn emit_after<F>(
        &self,
        event: &Event,
        options: Option<EmitOptions>,
        action: F,
    ) -> BusResult<()>
    where
        F: FnOnce(),
    {
        action();
        self.emit(event, Payload::Null, options).await
    }

    /// [`emit_after`](Self::emit_after) 的异步版本：先等待 `action` 完成再发射
    pub async fn emit_after_async<Fut>(
        &self,
        event: &Event,
        options: Option<EmitOptions>,
        action: Fut,
    ) -> BusResult<()>
    where
        Fut: Future<Output = ()>,
    {
        action.await;
        self.emit(event, Payload::Null, options).await
    }
}

/// 执行单个处理器，失败（含 panic）带上处理器名称写入失败通道
async fn run_handler(
    handler: HandlerRef,
    payload: Arc<Payload>,
    failures: mpsc::Sender<HandlerFailure>,
    detached: Arc<DetachedFailureStats>,
) {
    let outcome = AssertUnwindSafe(handler.handle(payload))
        .catch_unwind()
        .await;

    let err = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(panic) => anyhow::Error::new(HandlerPanic {
            message: panic_message(panic.as_ref()),
        }),
    };

    let failure = HandlerFailure::new(handler.handler_name(), err);
    // 通道容量等于处理器数量，只有接收端已关闭（上报被关闭）时才会失败
    if let Err(mpsc::error::TrySendError::Closed(failure)) = failures.try_send(failure) {
        detached.dropped.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(handler = %failure.handler, error = %failure.source, "handler failure dropped");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 接管失败通道，记录 `emit` 返回后才到达的失败
///
/// 后台任务在所有发送端释放后自行结束，不需要持有其句柄。
fn spawn_detached_reporter(
    event: Event,
    mut rx: mpsc::Receiver<HandlerFailure>,
    stats: Arc<DetachedFailureStats>,
) {
    tokio::spawn(async move {
        while let Some(failure) = rx.recv().await {
            tracing::warn!(
                event = %event,
                handler = %failure.handler,
                error = %format!("{:#}", failure.source),
                "detached handler failed after emit returned"
            );
            stats.reported.fetch_add(1, Ordering::AcqRel);
        }
    });
}
