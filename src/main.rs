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

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use handlescout::application::use_cases::run_batch::{BatchPaths, RunBatchUseCase};
use handlescout::config::settings::{RunMode, Settings};
use handlescout::engines::chromium_session::ChromiumSessionFactory;
use handlescout::utils::errors::RunError;
use handlescout::utils::run_log::{LogMode, RunLog};
use handlescout::utils::telemetry;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "handlescout", about = "Look up public profile details for a list of handles")]
struct Cli {
    /// Text file with one handle or profile URL per line
    input: PathBuf,
    /// Number of parallel lookup sessions
    #[arg(long, short)]
    concurrency: Option<usize>,
    /// One session at a time with a live progress line
    #[arg(long)]
    single: bool,
    /// Result file (defaults to the input path with a .json extension)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Run log file (defaults to the input path with a .log extension)
    #[arg(long)]
    log: Option<PathBuf>,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

/// 主函数
///
/// 加载配置，打开运行日志，执行整批查询并在结束时关闭浏览器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    let cli = Cli::parse();

    // 2. Load configuration, command line wins
    let mut settings = Settings::new().map_err(|e| RunError::Config(e.to_string()))?;
    if let Some(concurrency) = cli.concurrency {
        settings.runner.concurrency = concurrency;
    }
    if cli.single {
        settings.runner.mode = RunMode::Single;
    }
    if cli.headed {
        settings.browser.headless = false;
    }
    settings
        .validate()
        .map_err(|e| RunError::Config(e.to_string()))
        .context("Invalid command line options")?;
    info!(?settings, "Configuration loaded");

    let mut paths = BatchPaths::from_input(&cli.input);
    if let Some(output) = cli.output {
        paths.output = output;
    }
    if let Some(log) = cli.log {
        paths.log = log;
    }

    // 3. Open the run log
    let log_mode = match settings.runner.mode {
        RunMode::Single => LogMode::Redraw,
        RunMode::Batch => LogMode::Lines,
    };
    let log = Arc::new(RunLog::open(&paths.log, log_mode));

    // 4. Run the batch
    let factory = Arc::new(ChromiumSessionFactory::new(settings.browser.clone()));
    let use_case = RunBatchUseCase::new(factory.clone(), &settings, log.clone());

    let cancel = use_case.cancellation_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received, cancelling remaining lookups");
            cancel.cancel();
        }
    });

    let result = use_case.execute(&paths).await;
    drop(use_case);

    // 5. Shut the browser down
    match Arc::try_unwrap(factory) {
        Ok(factory) => factory.shutdown().await,
        Err(_) => warn!("Browser still referenced at shutdown, leaving it to process exit"),
    }

    if let Err(e) = &result {
        log.info(format!("Error: {}", e));
    }
    log.close();

    let report = result?;
    info!(
        total = report.summary.total(),
        output = %report.output.display(),
        "Run complete"
    );
    Ok(())
}
