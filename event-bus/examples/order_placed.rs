use async_trait::async_trait;
use event_bus::{
    BusError, EmitOptions, Event, EventBus, EventHandler, HandlerMap, HandlerRef, InvalidArgError,
    Payload, handler_fn,
};
use serde_json::json;
use std::sync::Arc;

const ORDER_PLACED: Event = Event::from_static("order-placed");
const ORDER_SHIPPED: Event = Event::from_static("order-shipped");

#[derive(Debug, thiserror::Error)]
#[error("insufficient stock for sku {sku}")]
struct InsufficientStock {
    sku: String,
}

struct ReserveStock;

#[async_trait]
impl EventHandler for ReserveStock {
    fn handler_name(&self) -> &str {
        "reserve_stock"
    }

    async fn handle(&self, payload: Arc<Payload>) -> anyhow::Result<()> {
        let Some(sku) = payload.get("sku").and_then(|v| v.as_str()) else {
            return Err(InvalidArgError::new(self.handler_name(), "{ sku: string }", &payload).into());
        };
        if sku == "out-of-stock" {
            return Err(InsufficientStock { sku: sku.into() }.into());
        }
        println!("reserved {sku}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::new();

    let send_receipt: HandlerRef = handler_fn("send_receipt", |payload| async move {
        println!("receipt sent for {payload}");
        Ok(())
    });

    bus.replace_handlers(HandlerMap::from([
        (ORDER_PLACED, vec![Arc::new(ReserveStock) as HandlerRef, send_receipt]),
        (
            ORDER_SHIPPED,
            vec![handler_fn("notify_customer", |_| async {
                println!("customer notified");
                Ok(())
            })],
        ),
    ]));

    // 等待全部处理器完成
    bus.emit(&ORDER_PLACED, json!({"sku": "book-42"}), Some(EmitOptions::blocking()))
        .await?;

    // 失败被聚合，其余处理器照常执行
    if let Err(BusError::Handlers(agg)) = bus
        .emit(&ORDER_PLACED, json!({"sku": "out-of-stock"}), Some(EmitOptions::sequential()))
        .await
    {
        println!("emit failed:\n{agg}");
        assert!(agg.contains::<InsufficientStock>());
    }

    // 负载形状由处理器自行校验
    if let Err(e) = bus
        .emit(&ORDER_PLACED, json!(7), Some(EmitOptions::sequential()))
        .await
    {
        println!("emit failed: {e}");
    }

    // 先做事，再宣布完成
    bus.emit_after(&ORDER_SHIPPED, Some(EmitOptions::blocking()), || {
        println!("parcel handed to carrier");
    })
    .await?;

    // 未注册的事件 -> 查找失败
    if let Err(BusError::HandlersNotFound { event }) =
        bus.emit(&Event::from("order-cancelled"), Payload::Null, None).await
    {
        println!("no handlers for {event}");
    }

    Ok(())
}
