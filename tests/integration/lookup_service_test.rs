// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 单次查询的状态轨迹与等待时间
#[cfg(test)]
mod tests {
    use crate::helpers::mock_session::{Behavior, MockSessionFactory};
    use crate::helpers::{lookup_settings, SharedBuffer};
    use handlescout::domain::models::{Identifier, LookupError, Task};
    use handlescout::domain::services::extraction_service::{fields, NO_BIO_LINK};
    use handlescout::domain::services::lookup_service::{LookupContext, LookupService, LookupState};
    use handlescout::utils::run_log::{LogMode, RunLog};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use LookupState::*;

    fn task(handle: &str) -> Task {
        Task {
            index: 0,
            identifier: Identifier::new(handle),
        }
    }

    fn quiet_log() -> RunLog {
        RunLog::new(LogMode::Lines, Box::new(SharedBuffer::default()), None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_lookup_walks_every_state() {
        let factory = Arc::new(MockSessionFactory::profiles(&["alice"]));
        let service = LookupService::new(factory.clone(), lookup_settings());
        let log = quiet_log();
        let cancel = CancellationToken::new();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let report = service.run(&task("alice"), &ctx).await;

        let record = report.result.unwrap();
        assert_eq!(record.input_identifier.as_str(), "alice");
        assert_eq!(record.profile_header.nickname, "alice nick");
        assert_eq!(record.stats.followers, "1,234");
        assert_eq!(record.bio.bio_link, NO_BIO_LINK);
        assert_eq!(
            report.lookup.history(),
            [Idle, Submitted, Polling, Stabilizing, Extracted, Closed]
        );
        assert_eq!(report.lookup.state(), Closed);
        assert_eq!(factory.stats.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_fails_then_closes() {
        let factory = Arc::new(MockSessionFactory::new([(
            "ghost",
            Behavior::profile("ghost").never(),
        )]));
        let service = LookupService::new(factory.clone(), lookup_settings());
        let log = quiet_log();
        let cancel = CancellationToken::new();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let report = service.run(&task("ghost"), &ctx).await;

        assert!(matches!(report.result, Err(LookupError::PollTimeout { .. })));
        assert_eq!(
            report.lookup.history(),
            [Idle, Submitted, Polling, Failed, Closed]
        );
        assert_eq!(factory.stats.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_follows_results() {
        let delay = Duration::from_secs(2);
        let factory = Arc::new(MockSessionFactory::new([(
            "alice",
            Behavior::profile("alice").after(delay),
        )]));
        let settings = lookup_settings();
        let settle = settings.settle();
        let service = LookupService::new(factory, settings);
        let log = quiet_log();
        let cancel = CancellationToken::new();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let started = Instant::now();
        let report = service.run(&task("alice"), &ctx).await;

        assert!(report.result.is_ok());
        assert!(started.elapsed() >= delay + settle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_username_alone_counts_as_loaded() {
        let factory = Arc::new(MockSessionFactory::new([(
            "quiet",
            Behavior::profile("quiet").with(fields::NICKNAME, ""),
        )]));
        let service = LookupService::new(factory, lookup_settings());
        let log = quiet_log();
        let cancel = CancellationToken::new();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let record = service.run(&task("quiet"), &ctx).await.result.unwrap();

        assert_eq!(record.profile_header.nickname, "");
        assert_eq!(record.profile_header.username, "@quiet");
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_lookup_opens_nothing() {
        let factory = Arc::new(MockSessionFactory::profiles(&["alice"]));
        let service = LookupService::new(factory.clone(), lookup_settings());
        let log = quiet_log();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let report = service.run(&task("alice"), &ctx).await;

        assert_eq!(report.result.unwrap_err(), LookupError::Cancelled);
        assert_eq!(report.lookup.state(), Closed);
        assert_eq!(factory.stats.opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_results_check_still_times_out() {
        let factory = Arc::new(MockSessionFactory::new([(
            "frozen",
            Behavior::profile("frozen").hanging(),
        )]));
        let settings = lookup_settings();
        let budget = settings.max_poll();
        let service = LookupService::new(factory.clone(), settings);
        let log = quiet_log();
        let cancel = CancellationToken::new();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let report = tokio::time::timeout(
            Duration::from_secs(600),
            service.run(&task("frozen"), &ctx),
        )
        .await
        .expect("poll budget must bound a stuck results check");

        match report.result {
            Err(LookupError::PollTimeout { elapsed }) => {
                assert!(elapsed >= budget);
                assert!(elapsed < budget + Duration::from_secs(1));
            }
            other => panic!("expected poll timeout, got {:?}", other),
        }
        assert_eq!(
            report.lookup.history(),
            [Idle, Submitted, Polling, Failed, Closed]
        );
        assert_eq!(factory.stats.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_open_fails_without_session() {
        let factory = Arc::new(MockSessionFactory::profiles(&["alice"]).panic_open(1));
        let service = LookupService::new(factory.clone(), lookup_settings());
        let log = quiet_log();
        let cancel = CancellationToken::new();
        let ctx = LookupContext {
            worker_id: 1,
            log: &log,
            cancel: &cancel,
        };

        let report = service.run(&task("alice"), &ctx).await;

        assert!(matches!(
            report.result,
            Err(LookupError::Aborted(ref msg)) if msg.contains("browser handler died")
        ));
        assert_eq!(report.lookup.history(), [Idle, Submitted, Failed, Closed]);
        assert_eq!(factory.stats.opened(), 0);
    }
}
