// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LookupSettings;
use crate::domain::models::outcome::LookupError;
use crate::domain::models::profile::ProfileRecord;
use crate::domain::models::task::Task;
use crate::domain::services::extraction_service::{fields, ExtractionService};
use crate::engines::traits::{Session, SessionError, SessionFactory};
use crate::utils::errors::panic_message;
use crate::utils::run_log::{LogEvent, RunLog};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 单次查询的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Submitted,
    Polling,
    Stabilizing,
    Extracted,
    Closed,
    Failed,
}

impl LookupState {
    /// 合法的状态迁移
    ///
    /// `Failed` 只能从 `Submitted`、`Polling`、`Stabilizing` 进入；
    /// `Closed` 在成功（`Extracted`）和失败（`Failed`）之后都会进入。
    pub fn can_transition_to(self, next: LookupState) -> bool {
        use LookupState::*;
        matches!(
            (self, next),
            (Idle, Submitted)
                | (Submitted, Polling)
                | (Polling, Stabilizing)
                | (Stabilizing, Extracted)
                | (Submitted | Polling | Stabilizing, Failed)
                | (Extracted | Failed, Closed)
        )
    }
}

/// 查询状态机，记录经历过的全部状态
#[derive(Debug, Clone)]
pub struct Lookup {
    history: Vec<LookupState>,
}

impl Lookup {
    fn new() -> Self {
        Self {
            history: vec![LookupState::Idle],
        }
    }

    pub fn state(&self) -> LookupState {
        self.history
            .last()
            .copied()
            .unwrap_or(LookupState::Idle)
    }

    pub fn history(&self) -> &[LookupState] {
        &self.history
    }

    fn advance(&mut self, next: LookupState) {
        let current = self.state();
        if !current.can_transition_to(next) {
            warn!(?current, ?next, "Unexpected lookup state transition");
        }
        debug!(from = ?current, to = ?next, "Lookup state transition");
        self.history.push(next);
    }
}

/// 单次查询的结果和状态轨迹
#[derive(Debug)]
pub struct LookupReport {
    pub result: Result<ProfileRecord, LookupError>,
    pub lookup: Lookup,
}

/// 查询时的 worker 上下文
pub struct LookupContext<'a> {
    pub worker_id: usize,
    pub log: &'a RunLog,
    pub cancel: &'a CancellationToken,
}

impl LookupContext<'_> {
    fn line(&self, message: impl Into<String>) {
        self.log.log(&LogEvent::new(self.worker_id, message));
    }

    fn progress(&self, message: impl Into<String>) {
        self.log.progress(&LogEvent::new(self.worker_id, message));
    }
}

/// 查询服务
///
/// 驱动一次查询走完 提交 → 轮询 → 稳定 → 提取 → 关闭。
/// 会话在每条退出路径上都会被关闭，包括失败、取消和 panic。
pub struct LookupService {
    factory: Arc<dyn SessionFactory>,
    settings: LookupSettings,
    extraction: ExtractionService,
}

impl LookupService {
    pub fn new(factory: Arc<dyn SessionFactory>, settings: LookupSettings) -> Self {
        let extraction = ExtractionService::new(settings.placeholder_bio_link.clone());
        Self {
            factory,
            settings,
            extraction,
        }
    }

    /// 执行一次完整查询
    pub async fn run(&self, task: &Task, ctx: &LookupContext<'_>) -> LookupReport {
        let mut lookup = Lookup::new();
        lookup.advance(LookupState::Submitted);

        let opened = AssertUnwindSafe(self.open_session(ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(LookupError::Aborted(panic_message(panic.as_ref()))));
        let session = match opened {
            Ok(session) => session,
            Err(e) => {
                lookup.advance(LookupState::Failed);
                lookup.advance(LookupState::Closed);
                return LookupReport {
                    result: Err(e),
                    lookup,
                };
            }
        };

        let result = AssertUnwindSafe(self.drive(session.as_ref(), task, ctx, &mut lookup))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(LookupError::Aborted(panic_message(panic.as_ref()))));

        if result.is_err() {
            lookup.advance(LookupState::Failed);
        }
        if let Err(e) = session.close().await {
            warn!(
                worker_id = ctx.worker_id,
                identifier = %task.identifier,
                error = %e,
                "Failed to close session"
            );
        }
        lookup.advance(LookupState::Closed);

        LookupReport { result, lookup }
    }

    async fn open_session(&self, ctx: &LookupContext<'_>) -> Result<Box<dyn Session>, LookupError> {
        let limit = self.settings.initial_load_timeout();
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(LookupError::Cancelled),
            opened = timeout(limit, self.factory.open()) => match opened {
                Ok(Ok(session)) => Ok(session),
                Ok(Err(e)) => Err(LookupError::SessionOpen(e.to_string())),
                Err(_) => Err(LookupError::SessionOpen(format!(
                    "{} did not open a session within {}s",
                    self.factory.name(),
                    limit.as_secs()
                ))),
            },
        }
    }

    async fn drive(
        &self,
        session: &dyn Session,
        task: &Task,
        ctx: &LookupContext<'_>,
        lookup: &mut Lookup,
    ) -> Result<ProfileRecord, LookupError> {
        self.submit(session, task, ctx).await?;

        lookup.advance(LookupState::Polling);
        let waited = self.poll_results(session, task, ctx).await?;
        ctx.line(format!(
            "Loaded results for @{} after {:.1}s",
            task.identifier,
            waited.as_secs_f64()
        ));

        lookup.advance(LookupState::Stabilizing);
        let settle = self.settings.settle();
        ctx.line(format!("Stabilizing {:.1}s...", settle.as_secs_f64()));
        self.pause(settle, ctx).await?;

        let record = self.extraction.extract(session, &task.identifier).await?;
        lookup.advance(LookupState::Extracted);
        Ok(record)
    }

    /// 打开首页，等待输入框出现，填入账号并点击搜索
    async fn submit(
        &self,
        session: &dyn Session,
        task: &Task,
        ctx: &LookupContext<'_>,
    ) -> Result<(), LookupError> {
        let limit = self.settings.initial_load_timeout();
        let submit = async {
            session
                .navigate(&self.settings.base_url)
                .await
                .map_err(|e| LookupError::Unreachable(e.to_string()))?;

            while !session
                .is_visible(fields::USERNAME_INPUT)
                .await
                .map_err(|e| LookupError::Unreachable(e.to_string()))?
            {
                sleep(self.settings.poll_interval()).await;
            }

            session
                .locate_and_fill(fields::USERNAME_INPUT, task.identifier.as_str())
                .await
                .map_err(|e| LookupError::Unreachable(e.to_string()))?;
            session
                .click(fields::SEARCH_BUTTON)
                .await
                .map_err(|e| LookupError::Unreachable(e.to_string()))?;
            Ok::<(), LookupError>(())
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(LookupError::Cancelled),
            submitted = timeout(limit, submit) => submitted.unwrap_or_else(|_| {
                Err(LookupError::Unreachable(format!(
                    "query input not available within {}s",
                    limit.as_secs()
                )))
            }),
        }
    }

    /// 轮询结果卡片，直到昵称或用户名之一非空
    ///
    /// 轮询预算覆盖整个循环，单次探测卡住也会按超时失败。
    async fn poll_results(
        &self,
        session: &dyn Session,
        task: &Task,
        ctx: &LookupContext<'_>,
    ) -> Result<Duration, LookupError> {
        let started = Instant::now();
        let budget = self.settings.max_poll();

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(LookupError::Cancelled),
            polled = timeout(budget, self.poll_until_ready(session, task, ctx, started)) => {
                polled.unwrap_or_else(|_| Err(LookupError::PollTimeout {
                    elapsed: started.elapsed(),
                }))
            }
        }
    }

    async fn poll_until_ready(
        &self,
        session: &dyn Session,
        task: &Task,
        ctx: &LookupContext<'_>,
        started: Instant,
    ) -> Result<Duration, LookupError> {
        loop {
            if self.results_ready(session).await? {
                return Ok(started.elapsed());
            }

            ctx.progress(format!(
                "Waiting for results @{} {}s",
                task.identifier,
                started.elapsed().as_secs()
            ));
            self.pause(self.settings.poll_interval(), ctx).await?;
        }
    }

    async fn results_ready(&self, session: &dyn Session) -> Result<bool, LookupError> {
        match probe_results(session).await {
            Ok(ready) => Ok(ready),
            Err(e) if e.is_not_ready() => Ok(false),
            Err(e) => Err(LookupError::Unreachable(e.to_string())),
        }
    }

    async fn pause(&self, duration: Duration, ctx: &LookupContext<'_>) -> Result<(), LookupError> {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(LookupError::Cancelled),
            _ = sleep(duration) => Ok(()),
        }
    }
}

async fn probe_results(session: &dyn Session) -> Result<bool, SessionError> {
    if !session.is_visible(fields::RESULTS_CARD).await? {
        return Ok(false);
    }
    let nickname = session.read_text(fields::NICKNAME).await?;
    if !nickname.trim().is_empty() {
        return Ok(true);
    }
    let username = session.read_text(fields::USERNAME).await?;
    Ok(!username.trim().is_empty())
}
