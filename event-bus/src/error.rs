//! 事件总线统一错误定义
//!
//! - `BusError`：`emit` 的返回错误（查找失败 / 处理器失败聚合）；
//! - `AggregateError`：一次发射中所有处理器失败的组合，保留每个失败的来源处理器；
//! - `InvalidArgError`：处理器自行校验负载形状失败时返回的错误；
//! - `HandlerPanic`：处理器 panic 后由引擎转换而来的失败。
//!
use crate::event::{Event, Payload};
use std::fmt;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BusError {
    #[error("no handlers registered for event: {event}")]
    HandlersNotFound { event: Event },

    #[error(transparent)]
    Handlers(#[from] AggregateError),
}

impl BusError {
    /// 若为处理器失败，返回其聚合错误
    pub fn aggregate(&self) -> Option<&AggregateError> {
        match self {
            BusError::Handlers(agg) => Some(agg),
            _ => None,
        }
    }
}

/// 统一 Result 类型别名
pub type BusResult<T> = Result<T, BusError>;

/// 负载形状不符合处理器预期
#[derive(Debug, Clone, Error)]
#[error("invalid argument for handler {handler}: expected {expected}, got {actual}")]
pub struct InvalidArgError {
    pub handler: String,
    pub expected: String,
    pub actual: Payload,
}

impl InvalidArgError {
    pub fn new(handler: impl Into<String>, expected: impl Into<String>, actual: &Payload) -> Self {
        Self {
            handler: handler.into(),
            expected: expected.into(),
            actual: actual.clone(),
        }
    }
}

/// 处理器执行期间发生 panic
#[derive(Debug, Clone, Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanic {
    pub message: String,
}

/// 单个处理器失败，带有来源处理器名称
#[derive(Debug)]
pub struct HandlerFailure {
    pub handler: String,
    pub source: anyhow::Error,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:#}` 展开 anyhow 的上下文链
        write!(f, "[{}]: {:#}", self.handler, self.source)
    }
}

impl std::error::Error for HandlerFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl HandlerFailure {
    pub fn new(handler: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            handler: handler.into(),
            source,
        }
    }

    /// 失败链中是否包含类型 `E`
    pub fn is<E>(&self) -> bool
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.find::<E>().is_some()
    }

    pub fn find<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source.chain().find_map(|e| e.downcast_ref::<E>())
    }
}

/// 聚合错误：一次发射中全部处理器失败的组合
///
/// 文本形式逐行列出每个失败（`[handler]: reason`）；
/// 空聚合不应作为错误返回，使用 [`AggregateError::into_result`] 转换。
#[derive(Debug, Default)]
pub struct AggregateError {
    failures: Vec<HandlerFailure>,
}

impl AggregateError {
    pub fn new(failures: Vec<HandlerFailure>) -> Self {
        Self { failures }
    }

    pub fn push(&mut self, failure: HandlerFailure) {
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HandlerFailure> {
        self.failures.iter()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// 是否存在任一失败的错误链中包含类型 `E`
    pub fn contains<E>(&self) -> bool
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.failures.iter().any(HandlerFailure::is::<E>)
    }

    /// 返回第一个匹配类型 `E` 的底层错误
    pub fn find<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.failures.iter().find_map(HandlerFailure::find::<E>)
    }

    /// 失败的处理器名称列表（顺序同收集顺序）
    pub fn failed_handlers(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.handler.as_str()).collect()
    }

    /// 空聚合视为成功
    pub fn into_result(self) -> Result<(), AggregateError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl IntoIterator for AggregateError {
    type Item = HandlerFailure;
    type IntoIter = std::vec::IntoIter<HandlerFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a HandlerFailure;
    type IntoIter = std::slice::Iter<'a, HandlerFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

impl FromIterator<HandlerFailure> for AggregateError {
    fn from_iter<T: IntoIterator<Item = HandlerFailure>>(iter: T) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Error)]
    #[error("insufficient stock")]
    struct InsufficientStock;

    #[test]
    fn display_lists_every_failure_with_origin() {
        let agg: AggregateError = vec![
            HandlerFailure::new("reserve_stock", InsufficientStock.into()),
            HandlerFailure::new("charge_card", anyhow::anyhow!("card declined")),
        ]
        .into_iter()
        .collect();

        let msg = agg.to_string();
        assert_eq!(
            msg,
            "[reserve_stock]: insufficient stock\n[charge_card]: card declined"
        );
        assert_eq!(agg.failed_handlers(), vec!["reserve_stock", "charge_card"]);
    }

    #[test]
    fn contains_searches_through_context_chain() {
        let err = anyhow::Error::new(InsufficientStock).context("reserving order items");
        let agg = AggregateError::new(vec![HandlerFailure::new("reserve_stock", err)]);

        assert!(agg.contains::<InsufficientStock>());
        assert!(!agg.contains::<HandlerPanic>());
        assert!(agg.find::<InsufficientStock>().is_some());
        assert!(agg.to_string().contains("reserving order items"));
        assert!(agg.to_string().contains("insufficient stock"));
    }

    #[test]
    fn empty_aggregate_is_success() {
        assert!(AggregateError::default().into_result().is_ok());

        let agg = AggregateError::new(vec![HandlerFailure::new("h", anyhow::anyhow!("boom"))]);
        let err = agg.into_result().unwrap_err();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn invalid_arg_message_carries_expected_and_actual() {
        let err = InvalidArgError::new("send_email", "object with `email`", &json!(42));
        assert_eq!(
            err.to_string(),
            "invalid argument for handler send_email: expected object with `email`, got 42"
        );
    }

    #[test]
    fn bus_error_exposes_aggregate() {
        let not_found = BusError::HandlersNotFound {
            event: Event::from("missing"),
        };
        assert!(not_found.aggregate().is_none());
        assert_eq!(
            not_found.to_string(),
            "no handlers registered for event: missing"
        );

        let agg = AggregateError::new(vec![HandlerFailure::new("h", anyhow::anyhow!("boom"))]);
        let err = BusError::from(agg);
        assert_eq!(err.aggregate().map(AggregateError::len), Some(1));
        assert_eq!(err.to_string(), "[h]: boom");
    }
}
