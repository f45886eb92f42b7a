//! 演示：以事件驱动一个多阶段抓取流程
//!
//! 日志级别通过 `RUST_LOG` 控制，例如 `RUST_LOG=event_bus=debug,demo=info`。
//!
mod jobs;
mod workflow;

use anyhow::Result;
use event_bus::{EmitOptions, EventBus};
use jobs::{JobStore, ScrapeJob};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("demo=info".parse()?))
        .init();

    let bus = Arc::new(EventBus::new());
    let store = Arc::new(JobStore::default());
    bus.replace_handlers(workflow::handlers(&bus, &store));

    // 生产者位于流程之外：API 请求、定时任务等
    let mut ids = Vec::new();
    for website in ["example.com", "rust-lang.org"] {
        let job = ScrapeJob::new(website);
        ids.push(job.id);
        bus.emit(
            &workflow::NEW_SCRAPE_JOB,
            serde_json::to_value(&job)?,
            Some(EmitOptions::blocking()),
        )
        .await?;
    }

    for id in ids {
        let job = store.get(id)?;
        tracing::info!(job_id = %job.id, status = ?job.status, report = ?job.report_results, "job state");
    }

    // 未注册的事件：查找失败
    if let Err(e) = bus
        .emit(&"unknown-event".into(), serde_json::Value::Null, None)
        .await
    {
        tracing::warn!(error = %e, "emit failed");
    }

    Ok(())
}
