// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{Session, SessionError, SessionFactory};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 页面脚本读取元素时的返回值，`found` 为 false 表示元素不存在
#[derive(Debug, Deserialize)]
struct Probe<T> {
    found: bool,
    value: T,
}

fn js_string(value: &str) -> String {
    // A JSON string literal is a valid JS string literal
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn visibility_script(field_id: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.getElementById({id});
    if (!el) return {{ found: false, value: false }};
    const style = window.getComputedStyle(el);
    const shown = style.display !== "none" && style.visibility !== "hidden"
        && el.getClientRects().length > 0;
    return {{ found: true, value: shown }};
}})()"#,
        id = js_string(field_id)
    )
}

fn text_script(field_id: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.getElementById({id});
    if (!el) return {{ found: false, value: "" }};
    return {{ found: true, value: (el.innerText || el.textContent || "").trim() }};
}})()"#,
        id = js_string(field_id)
    )
}

// Prefers the DOM property so links resolve to absolute URLs
fn attribute_script(field_id: &str, name: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.getElementById({id});
    if (!el) return {{ found: false, value: "" }};
    const prop = el[{name}];
    const raw = (typeof prop === "string") ? prop : el.getAttribute({name});
    return {{ found: true, value: raw == null ? "" : String(raw) }};
}})()"#,
        id = js_string(field_id),
        name = js_string(name)
    )
}

fn clear_script(field_id: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.getElementById({id});
    if (el) {{ el.value = ""; }}
    return true;
}})()"#,
        id = js_string(field_id)
    )
}

/// 基于 chromiumoxide 的会话：每个会话独占一个新页面
pub struct ChromiumSession {
    page: Page,
}

impl ChromiumSession {
    async fn probe<T: DeserializeOwned>(
        &self,
        field_id: &str,
        script: String,
    ) -> Result<T, SessionError> {
        let probe: Probe<T> = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Disconnected(e.to_string()))?
            .into_value()
            .map_err(|e| SessionError::Other(format!("Unexpected script result: {}", e)))?;

        if probe.found {
            Ok(probe.value)
        } else {
            Err(SessionError::ElementNotFound(field_id.to_string()))
        }
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        // goto waits for the load event
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn locate_and_fill(&self, field_id: &str, text: &str) -> Result<(), SessionError> {
        let element = self
            .page
            .find_element(format!("#{}", field_id))
            .await
            .map_err(|_| SessionError::ElementNotFound(field_id.to_string()))?;

        element
            .click()
            .await
            .map_err(|e| SessionError::Other(format!("Focus failed: {}", e)))?;
        self.page
            .evaluate(clear_script(field_id))
            .await
            .map_err(|e| SessionError::Other(format!("Clear failed: {}", e)))?;
        element
            .type_str(text)
            .await
            .map_err(|e| SessionError::Other(format!("Input failed: {}", e)))?;
        Ok(())
    }

    async fn click(&self, field_id: &str) -> Result<(), SessionError> {
        self.page
            .find_element(format!("#{}", field_id))
            .await
            .map_err(|_| SessionError::ElementNotFound(field_id.to_string()))?
            .click()
            .await
            .map_err(|e| SessionError::Other(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn is_visible(&self, field_id: &str) -> Result<bool, SessionError> {
        match self.probe::<bool>(field_id, visibility_script(field_id)).await {
            Ok(visible) => Ok(visible),
            Err(SessionError::ElementNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read_text(&self, field_id: &str) -> Result<String, SessionError> {
        self.probe(field_id, text_script(field_id)).await
    }

    async fn read_attribute(&self, field_id: &str, name: &str) -> Result<String, SessionError> {
        self.probe(field_id, attribute_script(field_id, name)).await
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.page
            .close()
            .await
            .map_err(|e| SessionError::Other(format!("Page close failed: {}", e)))
    }
}

/// chromiumoxide 会话工厂
///
/// 浏览器在第一次打开会话时启动（或连接远程实例），之后所有会话共用同一个
/// 浏览器进程，每个会话一个独立页面。运行结束时调用 `shutdown`。
pub struct ChromiumSessionFactory {
    settings: BrowserSettings,
    browser: OnceCell<Browser>,
    handler: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumSessionFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: OnceCell::new(),
            handler: parking_lot::Mutex::new(None),
        }
    }

    async fn browser(&self) -> Result<&Browser, SessionError> {
        self.browser
            .get_or_try_init(|| async {
                let remote_debugging_url = self
                    .settings
                    .remote_debugging_url
                    .clone()
                    .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok());

                let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url).await.map_err(|e| {
                        SessionError::Launch(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let mut builder = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(self.settings.request_timeout_secs))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage");
                    if !self.settings.headless {
                        builder = builder.with_head();
                    }

                    let config = builder.build().map_err(SessionError::Launch)?;
                    Browser::launch(config)
                        .await
                        .map_err(|e| SessionError::Launch(e.to_string()))?
                };

                let handle = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });
                *self.handler.lock() = Some(handle);

                Ok(browser)
            })
            .await
    }

    /// 关闭浏览器并结束事件处理任务
    pub async fn shutdown(self) {
        if let Some(mut browser) = self.browser.into_inner() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
        }
        if let Some(handle) = self.handler.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError> {
        let browser = self.browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(format!("Failed to open page: {}", e)))?;
        Ok(Box::new(ChromiumSession { page }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
