//! 抓取任务（ScrapeJob）与内存存储
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeJobStatus {
    Created,
    Started,
    Scraped,
    ReportCreated,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: Uuid,
    pub website: String,
    pub status: ScrapeJobStatus,
    pub scrape_results: Option<String>,
    pub report_results: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ScrapeJob {
    pub fn new(website: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            website: website.into(),
            status: ScrapeJobStatus::Created,
            scrape_results: None,
            report_results: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(Uuid),
    #[error("job store lock poisoned")]
    Poisoned,
}

/// 处理器之间共享的任务存储；加锁策略由存储自身负责，总线不介入
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, ScrapeJob>>,
}

impl JobStore {
    pub fn insert(&self, job: ScrapeJob) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| JobStoreError::Poisoned)?;
        jobs.insert(job.id, job);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<ScrapeJob, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| JobStoreError::Poisoned)?;
        jobs.get(&id).cloned().ok_or(JobStoreError::NotFound(id))
    }

    /// 就地修改已存在的任务并返回修改后的副本
    pub fn update<F>(&self, id: Uuid, f: F) -> Result<ScrapeJob, JobStoreError>
    where
        F: FnOnce(&mut ScrapeJob),
    {
        let mut jobs = self.jobs.write().map_err(|_| JobStoreError::Poisoned)?;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        f(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}
