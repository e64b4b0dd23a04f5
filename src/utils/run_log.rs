// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::LogWriteError;
use chrono::{Local, SecondsFormat};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// 日志输出目标
pub type Sink = Box<dyn Write + Send>;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// 运行日志模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// 每条事件一行（批量模式）
    Lines,
    /// 进度事件在控制台原地刷新（单会话模式）
    Redraw,
}

/// 日志事件
///
/// `worker_id` 为 0 表示来自调度器本身
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub worker_id: usize,
    pub message: String,
}

impl LogEvent {
    pub fn new(worker_id: usize, message: impl Into<String>) -> Self {
        Self {
            worker_id,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.worker_id == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "[worker-{}] {}", self.worker_id, self.message)
        }
    }
}

struct Sinks {
    interactive: Sink,
    durable: Option<Sink>,
    /// 控制台光标停留在一条未换行的进度行上
    redraw_pending: bool,
    redraw_width: usize,
    spinner: usize,
    last_progress: HashMap<usize, String>,
}

impl Sinks {
    fn write_interactive(&mut self, text: &str) {
        if self.redraw_pending {
            let _ = self.interactive.write_all(b"\n");
            self.redraw_pending = false;
            self.redraw_width = 0;
        }
        let _ = self
            .interactive
            .write_all(text.as_bytes())
            .and_then(|_| self.interactive.flush());
    }

    fn redraw_interactive(&mut self, text: &str) {
        let width = text.chars().count();
        let padding = self.redraw_width.saturating_sub(width);
        let frame = format!("\r{}{}", text, " ".repeat(padding));
        let _ = self
            .interactive
            .write_all(frame.as_bytes())
            .and_then(|_| self.interactive.flush());
        self.redraw_pending = true;
        self.redraw_width = width;
    }

    fn write_durable(&mut self, line: &str) {
        let Some(durable) = self.durable.as_mut() else {
            return;
        };

        let stamped = format!(
            "{} {}\n",
            Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            line
        );
        let result = durable
            .write_all(stamped.as_bytes())
            .and_then(|_| durable.flush());

        if let Err(e) = result {
            let err = LogWriteError::from(e);
            warn!(error = %err, "Durable run log disabled");
            self.durable = None;
            self.write_interactive(&format!(
                "warning: {}; continuing with console output only\n",
                err
            ));
        }
    }
}

/// 运行日志
///
/// 把并发 worker 的事件串行写入两个目标：控制台（交互）和日志文件（持久）。
/// 两个目标在同一把锁内写入，因此顺序一致且不会交错。
/// 持久目标总是收到完整的行；`LogMode::Redraw` 下控制台的进度行原地刷新。
pub struct RunLog {
    mode: LogMode,
    sinks: Mutex<Sinks>,
}

impl RunLog {
    pub fn new(mode: LogMode, interactive: Sink, durable: Option<Sink>) -> Self {
        Self {
            mode,
            sinks: Mutex::new(Sinks {
                interactive,
                durable,
                redraw_pending: false,
                redraw_width: 0,
                spinner: 0,
                last_progress: HashMap::new(),
            }),
        }
    }

    /// 控制台 + 日志文件
    ///
    /// 日志文件在运行开始时截断。无法创建时只写控制台并给出警告，运行不中断。
    pub fn open(path: &Path, mode: LogMode) -> Self {
        let durable: Option<Sink> = match File::create(path) {
            Ok(file) => Some(Box::new(file)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot open run log file");
                None
            }
        };
        let log = Self::new(mode, Box::new(io::stdout()), durable);
        if !log.has_durable() {
            log.info(format!(
                "warning: cannot open log file {}; console output only",
                path.display()
            ));
        }
        log
    }

    pub fn has_durable(&self) -> bool {
        self.sinks.lock().durable.is_some()
    }

    /// 来自调度器的普通消息
    pub fn info(&self, message: impl Into<String>) {
        self.log(&LogEvent::new(0, message));
    }

    /// 写入一条完整的日志行
    pub fn log(&self, event: &LogEvent) {
        tracing::debug!(worker_id = event.worker_id, "{}", event.message);

        let line = event.to_string();
        let mut sinks = self.sinks.lock();
        sinks.write_interactive(&format!("{}\n", line));
        sinks.write_durable(&line);
    }

    /// 写入一条进度消息
    ///
    /// 同一 worker 连续相同的进度消息只进入持久日志一次。
    pub fn progress(&self, event: &LogEvent) {
        tracing::trace!(worker_id = event.worker_id, "{}", event.message);

        let line = event.to_string();
        let mut sinks = self.sinks.lock();
        let changed = sinks
            .last_progress
            .get(&event.worker_id)
            .map_or(true, |last| *last != event.message);

        match self.mode {
            LogMode::Redraw => {
                let frame = SPINNER[sinks.spinner % SPINNER.len()];
                sinks.spinner = sinks.spinner.wrapping_add(1);
                sinks.redraw_interactive(&format!("{} {}", line, frame));
            }
            LogMode::Lines => {
                if changed {
                    sinks.write_interactive(&format!("{}\n", line));
                }
            }
        }

        if changed {
            sinks.write_durable(&line);
            sinks
                .last_progress
                .insert(event.worker_id, event.message.clone());
        }
    }

    /// 刷新并关闭持久日志
    pub fn close(&self) {
        let mut sinks = self.sinks.lock();
        if sinks.redraw_pending {
            sinks.write_interactive("");
        }
        let _ = sinks.interactive.flush();
        if let Some(mut durable) = sinks.durable.take() {
            if let Err(e) = durable.flush() {
                warn!(error = %e, "Failed to flush run log on close");
            }
        }
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog")
            .field("mode", &self.mode)
            .field("durable", &self.has_durable())
            .finish()
    }
}
