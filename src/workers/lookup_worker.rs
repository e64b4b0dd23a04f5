// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use dashmap::DashMap;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::domain::models::outcome::{LookupError, Outcome};
use crate::domain::models::task::Task;
use crate::domain::services::lookup_service::{LookupContext, LookupService};
use crate::queue::task_queue::TaskQueue;
use crate::utils::errors::panic_message;
use crate::utils::run_log::{LogEvent, RunLog};

/// 查询工作者
///
/// 一次只处理一个任务：从队列取任务，驱动完整查询，把终态结果按下标写入结果表
pub struct LookupWorker {
    worker_id: usize,
    total: usize,
    service: Arc<LookupService>,
    log: Arc<RunLog>,
    results: Arc<DashMap<usize, Outcome>>,
    cancel: CancellationToken,
}

impl LookupWorker {
    /// 创建新的查询工作器实例
    pub fn new(
        worker_id: usize,
        total: usize,
        service: Arc<LookupService>,
        log: Arc<RunLog>,
        results: Arc<DashMap<usize, Outcome>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            worker_id,
            total,
            service,
            log,
            results,
            cancel,
        }
    }

    /// 运行查询工作器，直到队列耗尽
    pub async fn run<Q>(&self, queue: Arc<Q>)
    where
        Q: TaskQueue + ?Sized,
    {
        info!(worker_id = self.worker_id, "Lookup worker started");

        let mut processed = 0usize;
        while let Some(task) = queue.dequeue(self.worker_id).await {
            let index = task.index;
            // Panics outside the session still yield exactly one outcome
            let outcome = match AssertUnwindSafe(self.process_task(&task))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => self.abandon(&task, panic_message(panic.as_ref())),
            };
            if self.results.insert(index, outcome).is_some() {
                error!(worker_id = self.worker_id, index, "Task produced more than one outcome");
            }
            processed += 1;
        }

        info!(worker_id = self.worker_id, processed, "Lookup worker finished");
    }

    /// 任务处理过程中 panic：记录失败并返回 `Aborted`
    fn abandon(&self, task: &Task, message: String) -> Outcome {
        let reason = LookupError::Aborted(message);
        error!(
            worker_id = self.worker_id,
            index = task.index,
            identifier = %task.identifier,
            error = %reason,
            "Lookup panicked outside the session"
        );
        self.log_failure(task, &reason);
        Outcome::failure(task.identifier.clone(), reason)
    }

    fn log_failure(&self, task: &Task, reason: &LookupError) {
        self.log.log(&LogEvent::new(
            self.worker_id,
            format!(
                "[{}/{}] Failed @{}: {} ({})",
                task.index + 1,
                self.total,
                task.identifier,
                reason,
                reason.kind()
            ),
        ));
    }

    #[instrument(skip(self, task), fields(worker_id = self.worker_id, index = task.index, identifier = %task.identifier))]
    async fn process_task(&self, task: &Task) -> Outcome {
        let position = format!("{}/{}", task.index + 1, self.total);

        if self.cancel.is_cancelled() {
            self.log.log(&LogEvent::new(
                self.worker_id,
                format!("[{}] Skipped @{} (cancelled)", position, task.identifier),
            ));
            return Outcome::failure(task.identifier.clone(), LookupError::Cancelled);
        }

        self.log.log(&LogEvent::new(
            self.worker_id,
            format!("[{}] Start @{}", position, task.identifier),
        ));

        let ctx = LookupContext {
            worker_id: self.worker_id,
            log: &self.log,
            cancel: &self.cancel,
        };
        let report = self.service.run(task, &ctx).await;

        match report.result {
            Ok(record) => {
                self.log.log(&LogEvent::new(
                    self.worker_id,
                    format!("[{}] Done @{}", position, task.identifier),
                ));
                Outcome::Success(record)
            }
            Err(reason) => {
                warn!(kind = reason.kind(), error = %reason, "Lookup failed");
                self.log_failure(task, &reason);
                Outcome::failure(task.identifier.clone(), reason)
            }
        }
    }
}
