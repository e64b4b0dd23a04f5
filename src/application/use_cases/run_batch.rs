// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::settings::Settings;
use crate::domain::models::outcome::Outcome;
use crate::domain::services::input_normalizer;
use crate::engines::traits::SessionFactory;
use crate::infrastructure::storage::JsonResultWriter;
use crate::utils::errors::RunError;
use crate::utils::run_log::RunLog;
use crate::workers::orchestrator::{Orchestrator, RunSummary};

// === Section: Run Artifacts ===

/// 一次运行涉及的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
}

impl BatchPaths {
    /// 结果和日志默认放在输入文件旁边，扩展名分别为 `.json` 和 `.log`
    pub fn from_input(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        Self {
            output: input.with_extension("json"),
            log: input.with_extension("log"),
            input,
        }
    }
}

/// 运行结果
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
    pub summary: RunSummary,
    pub output: PathBuf,
}

// === Section: Use Case Definition ===

pub struct RunBatchUseCase {
    orchestrator: Orchestrator,
    log: Arc<RunLog>,
    concurrency: usize,
    include_failures: bool,
}

// === Section: Implementation ===

impl RunBatchUseCase {
    pub fn new(factory: Arc<dyn SessionFactory>, settings: &Settings, log: Arc<RunLog>) -> Self {
        Self {
            orchestrator: Orchestrator::new(factory, settings.lookup.clone(), log.clone()),
            log,
            concurrency: settings.runner.effective_concurrency(),
            include_failures: settings.output.include_failures,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.orchestrator.cancellation_token()
    }

    /// 读取输入、执行整批查询并写出结果文件
    ///
    /// 输入和配置错误在任何任务开始前返回；单个任务的失败只体现在结果和统计中。
    pub async fn execute(&self, paths: &BatchPaths) -> Result<BatchReport, RunError> {
        if self.concurrency == 0 {
            return Err(RunError::InvalidConcurrency(self.concurrency));
        }

        self.log.info(format!("Input: {}", paths.input.display()));
        self.log.info(format!("Output: {}", paths.output.display()));
        self.log.info(format!("Log: {}", paths.log.display()));

        let identifiers = input_normalizer::read_identifiers(&paths.input).await?;
        self.log.info(format!(
            "Found {} identifiers, running with {} worker(s)",
            identifiers.len(),
            self.concurrency.min(identifiers.len().max(1))
        ));

        let outcomes = self.orchestrator.run(identifiers, self.concurrency).await?;
        self.write_output(&paths.output, &outcomes).await?;

        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Lookup batch finished"
        );
        self.log.info(format!(
            "Done: {} succeeded, {} failed. Wrote {}",
            summary.succeeded,
            summary.failed,
            paths.output.display()
        ));

        Ok(BatchReport {
            outcomes,
            summary,
            output: paths.output.clone(),
        })
    }

    async fn write_output(&self, path: &Path, outcomes: &[Outcome]) -> Result<(), RunError> {
        JsonResultWriter::new(path, self.include_failures)
            .write(outcomes)
            .await
            .map_err(|e| RunError::Output {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}
