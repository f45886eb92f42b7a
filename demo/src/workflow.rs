//! 多阶段抓取流程：创建任务 → 抓取网站 → 生成报告 → 完成
//!
//! 每个阶段都是一个事件处理器，完成后发射下一阶段的事件。
//!
use crate::jobs::{JobStore, ScrapeJob, ScrapeJobStatus};
use anyhow::Context;
use async_trait::async_trait;
use event_bus::{
    EmitOptions, Event, EventBus, EventHandler, HandlerMap, HandlerRef, InvalidArgError, Payload,
};
use std::sync::{Arc, Weak};

pub const NEW_SCRAPE_JOB: Event = Event::from_static("new-scrape-job");
pub const START_SCRAPE_JOB: Event = Event::from_static("start-scrape-job");
pub const SCRAPE_JOB_COMPLETE: Event = Event::from_static("scrape-job-complete");
pub const REPORT_GENERATED: Event = Event::from_static("report-generated");

/// 各阶段之间的链式发射都等待下游完成，使最外层的 `emit` 覆盖整条流程
const CHAIN: EmitOptions = EmitOptions::blocking();

fn parse_job(handler: &str, payload: &Payload) -> anyhow::Result<ScrapeJob> {
    serde_json::from_value(payload.clone())
        .map_err(|_| InvalidArgError::new(handler, "ScrapeJob", payload).into())
}

fn to_payload(job: &ScrapeJob) -> anyhow::Result<Payload> {
    serde_json::to_value(job).context("serializing scrape job")
}

/// 处理器只持有总线的弱引用：总线持有处理器，反向强引用会形成环
fn live_bus(bus: &Weak<EventBus>) -> anyhow::Result<Arc<EventBus>> {
    bus.upgrade().context("event bus has been dropped")
}

struct CreateJobRecord {
    bus: Weak<EventBus>,
    store: Arc<JobStore>,
}

#[async_trait]
impl EventHandler for CreateJobRecord {
    fn handler_name(&self) -> &str {
        "create_job_record"
    }

    async fn handle(&self, payload: Arc<Payload>) -> anyhow::Result<()> {
        let bus = live_bus(&self.bus)?;
        let job = parse_job(self.handler_name(), &payload)?;
        self.store.insert(job.clone())?;
        tracing::info!(job_id = %job.id, website = %job.website, "scrape job created");

        bus.emit(&START_SCRAPE_JOB, to_payload(&job)?, Some(CHAIN))
            .await?;
        Ok(())
    }
}

struct ScrapeWebsite {
    bus: Weak<EventBus>,
    store: Arc<JobStore>,
}

impl ScrapeWebsite {
    async fn scrape(&self, job: &ScrapeJob) -> anyhow::Result<String> {
        anyhow::ensure!(!job.website.is_empty(), "job {} has no website", job.id);
        Ok(format!("scraped {}", job.website))
    }
}

#[async_trait]
impl EventHandler for ScrapeWebsite {
    fn handler_name(&self) -> &str {
        "scrape_website"
    }

    async fn handle(&self, payload: Arc<Payload>) -> anyhow::Result<()> {
        let bus = live_bus(&self.bus)?;
        let job = parse_job(self.handler_name(), &payload)?;
        self.store
            .update(job.id, |j| j.status = ScrapeJobStatus::Started)?;

        let results = self.scrape(&job).await?;
        let job = self.store.update(job.id, |j| {
            j.status = ScrapeJobStatus::Scraped;
            j.scrape_results = Some(results);
        })?;
        tracing::info!(job_id = %job.id, "website scraped");

        bus.emit(&SCRAPE_JOB_COMPLETE, to_payload(&job)?, Some(CHAIN))
            .await?;
        Ok(())
    }
}

struct GenerateReport {
    bus: Weak<EventBus>,
    store: Arc<JobStore>,
}

#[async_trait]
impl EventHandler for GenerateReport {
    fn handler_name(&self) -> &str {
        "generate_report"
    }

    async fn handle(&self, payload: Arc<Payload>) -> anyhow::Result<()> {
        let bus = live_bus(&self.bus)?;
        let job = parse_job(self.handler_name(), &payload)?;
        let scraped = job.scrape_results.as_deref().unwrap_or_default();
        let report = format!("report for {} ({} bytes scraped)", job.website, scraped.len());

        let job = self.store.update(job.id, |j| {
            j.status = ScrapeJobStatus::ReportCreated;
            j.report_results = Some(report);
        })?;
        tracing::info!(job_id = %job.id, "report generated");

        let store = self.store.clone();
        let id = job.id;
        bus.emit_after(&REPORT_GENERATED, Some(CHAIN), move || {
            if let Err(e) = store.update(id, |j| j.status = ScrapeJobStatus::Finished) {
                tracing::error!(job_id = %id, error = %e, "failed to finish job");
            }
        })
        .await?;
        Ok(())
    }
}

/// 构建整条流程的处理器映射
pub fn handlers(bus: &Arc<EventBus>, store: &Arc<JobStore>) -> HandlerMap {
    let create: HandlerRef = Arc::new(CreateJobRecord {
        bus: Arc::downgrade(bus),
        store: store.clone(),
    });
    let scrape: HandlerRef = Arc::new(ScrapeWebsite {
        bus: Arc::downgrade(bus),
        store: store.clone(),
    });
    let report: HandlerRef = Arc::new(GenerateReport {
        bus: Arc::downgrade(bus),
        store: store.clone(),
    });
    let finished = event_bus::handler_fn("log_job_finished", |_| async {
        tracing::info!("scrape job finished");
        Ok(())
    });

    HandlerMap::from([
        (NEW_SCRAPE_JOB, vec![create]),
        (START_SCRAPE_JOB, vec![scrape]),
        (SCRAPE_JOB_COMPLETE, vec![report]),
        (REPORT_GENERATED, vec![finished]),
    ])
}
