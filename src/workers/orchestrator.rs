// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LookupSettings;
use crate::domain::models::outcome::{LookupError, Outcome};
use crate::domain::models::task::{Identifier, Task};
use crate::domain::services::lookup_service::LookupService;
use crate::engines::traits::SessionFactory;
use crate::queue::task_queue::InMemoryTaskQueue;
use crate::utils::errors::{panic_message, RunError};
use crate::utils::run_log::RunLog;
use crate::workers::lookup_worker::LookupWorker;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// 运行统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// 查询调度器
///
/// 维护固定大小的 worker 池，把任务分发出去，隔离单个任务的失败，
/// 最后按输入顺序返回每个任务的终态结果。
pub struct Orchestrator {
    service: Arc<LookupService>,
    log: Arc<RunLog>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        settings: LookupSettings,
        log: Arc<RunLog>,
    ) -> Self {
        Self {
            service: Arc::new(LookupService::new(factory, settings)),
            log,
            cancel: CancellationToken::new(),
        }
    }

    /// 用于取消整批运行的令牌
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 执行整批查询
    ///
    /// 返回的结果数量总是等于输入数量，`outcomes[i]` 对应 `identifiers[i]`，
    /// 与完成顺序无关。
    pub async fn run(
        &self,
        identifiers: Vec<Identifier>,
        concurrency: usize,
    ) -> Result<Vec<Outcome>, RunError> {
        if concurrency == 0 {
            return Err(RunError::InvalidConcurrency(concurrency));
        }

        let tasks = Task::batch(identifiers);
        let total = tasks.len();
        let pending: Vec<Identifier> = tasks.iter().map(|t| t.identifier.clone()).collect();
        let queue = Arc::new(InMemoryTaskQueue::new(tasks));
        let results: Arc<DashMap<usize, Outcome>> = Arc::new(DashMap::with_capacity(total));

        let workers = concurrency.min(total);
        info!(total, workers, "Starting lookup batch");

        let handles: Vec<JoinHandle<()>> = (1..=workers)
            .map(|worker_id| {
                let worker = LookupWorker::new(
                    worker_id,
                    total,
                    self.service.clone(),
                    self.log.clone(),
                    results.clone(),
                    self.cancel.clone(),
                );
                let queue = queue.clone();
                tokio::spawn(async move {
                    worker.run(queue).await;
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic().as_ref())
                } else {
                    e.to_string()
                };
                error!(worker_id = i + 1, error = %reason, "Lookup worker exited abnormally");
            }
        }

        // Emit in index order; any slot a dead worker never filled becomes a failure
        let outcomes = pending
            .into_iter()
            .enumerate()
            .map(|(index, identifier)| match results.remove(&index) {
                Some((_, outcome)) => outcome,
                None => Outcome::failure(
                    identifier,
                    LookupError::Aborted("worker exited before reporting an outcome".to_string()),
                ),
            })
            .collect();

        Ok(outcomes)
    }
}
