//! 进程内事件总线（event-bus）
//!
//! 生产者以事件名与负载发射事件，预先注册在该事件下的处理器依次被启动：
//! - `registry`：事件 → 有序处理器列表，仅支持整表原子替换；
//! - `bus`：发射引擎，支持并发/顺序执行与可选等待，并聚合所有处理器失败；
//! - `error`：查找失败、负载校验失败与聚合错误；
//! - `global`：可选的进程级默认实例。
//!
//! 典型用法：
//!
//! ```rust
//! use event_bus::{EmitOptions, Event, EventBus, HandlerMap, handler_fn};
//!
//! const ORDER_PLACED: Event = Event::from_static("order-placed");
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new();
//! bus.replace_handlers(HandlerMap::from([(
//!     ORDER_PLACED,
//!     vec![
//!         handler_fn("reserve_stock", |_| async { Ok(()) }),
//!         handler_fn("charge_card", |_| async { Err(anyhow::anyhow!("card declined")) }),
//!     ],
//! )]));
//!
//! let err = bus
//!     .emit(&ORDER_PLACED, serde_json::json!({"order_id": 1}), Some(EmitOptions::sequential()))
//!     .await
//!     .unwrap_err();
//! assert!(err.to_string().contains("[charge_card]: card declined"));
//! # }
//! ```
//!
pub mod bus;
pub mod error;
pub mod event;
pub mod global;
pub mod handler;
pub mod options;
pub mod registry;

pub use bus::{DetachedFailureStats, EventBus};
pub use error::{AggregateError, BusError, BusResult, HandlerFailure, HandlerPanic, InvalidArgError};
pub use event::{Event, Payload};
pub use handler::{EventHandler, FnHandler, HandlerRef, handler_fn};
pub use options::{EmitOptions, EventBusConfig};
pub use registry::{HandlerMap, HandlerRegistry};
