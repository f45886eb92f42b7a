//! 事件标识（Event）与事件负载（Payload）
//!
//! `Event` 仅作为查找处理器的键，不对其内容施加任何结构约束；
//! `Payload` 为动态类型负载，由生产者与处理器按约定解释。
//!
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 事件负载：动态 JSON 值，`Value::Null` 表示“无负载”
pub type Payload = serde_json::Value;

/// 事件标识：不可变、可比较、可哈希的字符串令牌
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Cow<'static, str>);

impl Event {
    /// 在 `const` 语境中声明事件，例如：
    ///
    /// ```rust
    /// use event_bus::Event;
    ///
    /// const ORDER_PLACED: Event = Event::from_static("order-placed");
    /// assert_eq!(ORDER_PLACED.as_str(), "order-placed");
    /// ```
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Event {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl AsRef<str> for Event {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
