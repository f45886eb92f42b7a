//! 发射选项与总线配置
//!
use bon::Builder;

/// 单次发射的执行方式
///
/// 两个开关相互独立，组合出四种模式：
///
/// | `concurrent` | `wait`  | 行为                                   |
/// |--------------|---------|----------------------------------------|
/// | `true`       | `false` | 并发执行，立即返回（默认）             |
/// | `true`       | `true`  | 并发执行，等待全部处理器结束           |
/// | `false`      | `false` | 在调用方上下文中逐个执行               |
/// | `false`      | `true`  | 同上，调用方天然等待每个处理器完成     |
#[derive(Builder, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    /// 每个处理器是否在独立的 tokio 任务中运行
    #[builder(default = true)]
    pub concurrent: bool,
    /// 是否等待全部处理器结束后再返回
    #[builder(default = false)]
    pub wait: bool,
}

impl EmitOptions {
    /// 并发执行，不等待
    pub const fn fire_and_forget() -> Self {
        Self {
            concurrent: true,
            wait: false,
        }
    }

    /// 并发执行并等待全部完成
    pub const fn blocking() -> Self {
        Self {
            concurrent: true,
            wait: true,
        }
    }

    /// 在调用方上下文中按注册顺序逐个执行
    pub const fn sequential() -> Self {
        Self {
            concurrent: false,
            wait: true,
        }
    }
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::fire_and_forget()
    }
}

/// 总线配置
#[derive(Builder, Clone, Copy, Debug)]
pub struct EventBusConfig {
    /// `emit` 未传入选项时使用的默认选项
    #[builder(default)]
    pub default_options: EmitOptions,
    /// 未等待的并发发射中，返回后才到达的失败是否交由后台任务记录日志
    #[builder(default = true)]
    pub report_detached_failures: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            default_options: EmitOptions::default(),
            report_detached_failures: true,
        }
    }
}
