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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 查询流程配置
    pub lookup: LookupSettings,
    /// 调度配置
    pub runner: RunnerSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 输出配置
    pub output: OutputSettings,
}

/// 查询流程配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LookupSettings {
    /// 查询服务首页
    pub base_url: String,
    /// 首页和输入框的初始加载超时（秒）
    pub initial_load_timeout_secs: u64,
    /// 结果轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 结果轮询上限（秒）
    pub max_poll_secs: u64,
    /// 结果出现后读取字段前的等待时间（毫秒）
    pub settle_ms: u64,
    /// 查询服务的占位简介链接，读取到时改写为 "N/A"
    pub placeholder_bio_link: String,
}

impl LookupSettings {
    pub fn initial_load_timeout(&self) -> Duration {
        Duration::from_secs(self.initial_load_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll(&self) -> Duration {
        Duration::from_secs(self.max_poll_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: "https://tikip.us/".to_string(),
            initial_load_timeout_secs: 30,
            poll_interval_ms: 100,
            max_poll_secs: 30,
            settle_ms: 3000,
            placeholder_bio_link: "https://tikip.us/#".to_string(),
        }
    }
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// 并发批量查询，逐行日志
    Batch,
    /// 单会话顺序查询，控制台进度原地刷新
    Single,
}

/// 调度配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    /// 并发 worker 数
    pub concurrency: usize,
    /// 运行模式
    pub mode: RunMode,
}

impl RunnerSettings {
    /// 实际使用的并发数，单会话模式固定为 1
    pub fn effective_concurrency(&self) -> usize {
        match self.mode {
            RunMode::Single => 1,
            RunMode::Batch => self.concurrency,
        }
    }
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头运行
    pub headless: bool,
    /// 远程调试地址，设置后连接已有 Chrome 而不是启动新进程
    pub remote_debugging_url: Option<String>,
    /// CDP 请求超时时间（秒）
    pub request_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            remote_debugging_url: None,
            request_timeout_secs: 30,
        }
    }
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 失败任务是否写入占位记录
    pub include_failures: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `HANDLESCOUT__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    ///
    /// 不做取值校验：命令行覆盖之后由调用方调用 `validate()`
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("HANDLESCOUT").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 只包含内置默认值的配置
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let settings: Settings = Self::defaults()?.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let lookup = LookupSettings::default();
        let browser = BrowserSettings::default();
        Config::builder()
            // Lookup flow
            .set_default("lookup.base_url", lookup.base_url)?
            .set_default("lookup.initial_load_timeout_secs", lookup.initial_load_timeout_secs)?
            .set_default("lookup.poll_interval_ms", lookup.poll_interval_ms)?
            .set_default("lookup.max_poll_secs", lookup.max_poll_secs)?
            .set_default("lookup.settle_ms", lookup.settle_ms)?
            .set_default("lookup.placeholder_bio_link", lookup.placeholder_bio_link)?
            // Runner
            .set_default("runner.concurrency", 10)?
            .set_default("runner.mode", "batch")?
            // Browser
            .set_default("browser.headless", browser.headless)?
            .set_default("browser.request_timeout_secs", browser.request_timeout_secs)?
            // Output
            .set_default("output.include_failures", true)
    }

    /// 校验取值范围，非法配置在任何任务开始前报错
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.concurrency == 0 {
            return Err(ConfigError::Message(
                "runner.concurrency must be at least 1".to_string(),
            ));
        }
        if self.lookup.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "lookup.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.lookup.base_url).map_err(|e| {
            ConfigError::Message(format!(
                "lookup.base_url `{}` is not a valid URL: {}",
                self.lookup.base_url, e
            ))
        })?;
        Ok(())
    }
}
