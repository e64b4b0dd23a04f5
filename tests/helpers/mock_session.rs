// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use handlescout::domain::services::extraction_service::fields;
use handlescout::engines::traits::{Session, SessionError, SessionFactory};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// 某个账号在模拟页面上的表现
#[derive(Debug, Clone)]
pub struct Behavior {
    /// 搜索后多久结果出现，`None` 表示永不出现
    pub results_after: Option<Duration>,
    /// 读取时缺失的元素
    pub missing_field: Option<&'static str>,
    /// 填写输入框时 panic
    pub panic_on_fill: bool,
    /// 检查结果卡片的调用永不返回
    pub hang_on_results: bool,
    /// 释放会话时 panic（计数已更新之后）
    pub panic_on_close: bool,
    pub values: HashMap<&'static str, String>,
}

impl Behavior {
    /// 一个完整的资料页
    pub fn profile(handle: &str) -> Self {
        let values = HashMap::from([
            (fields::NICKNAME, format!("{} nick", handle)),
            (fields::USERNAME, format!("@{}", handle)),
            (fields::PROFILE_LINK, format!("https://www.tiktok.com/@{}", handle)),
            (fields::AVATAR, format!("https://cdn.example/{}.jpg", handle)),
            (fields::DOWNLOAD_AVATAR_LINK, format!("https://tikip.us/dl/{}", handle)),
            (fields::ABOUT, "hello world".to_string()),
            (fields::BIO_LINK, "https://tikip.us/#".to_string()),
            (fields::USER_ID, "6812345678901234567".to_string()),
            (fields::COUNTRY, "DE".to_string()),
            (fields::LANGUAGE, "de".to_string()),
            (fields::CREATED_DATE, "2020-03-01".to_string()),
            (fields::NICKNAME_MODIFIED, "2023-01-02".to_string()),
            (fields::USERNAME_MODIFIED, "2022-11-30".to_string()),
            (fields::FOLLOWERS, "1,234".to_string()),
            (fields::FOLLOWING, "87".to_string()),
            (fields::HEARTS, "12.5K".to_string()),
            (fields::VIDEOS, "42".to_string()),
            (fields::FRIENDS, "9".to_string()),
        ]);
        Self {
            results_after: Some(Duration::from_millis(500)),
            missing_field: None,
            panic_on_fill: false,
            hang_on_results: false,
            panic_on_close: false,
            values,
        }
    }

    /// 只有昵称，其余字段为空字符串
    pub fn sparse(handle: &str) -> Self {
        let mut behavior = Self::profile(handle);
        for value in behavior.values.values_mut() {
            value.clear();
        }
        behavior
            .values
            .insert(fields::NICKNAME, format!("{} nick", handle));
        behavior
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.results_after = Some(delay);
        self
    }

    pub fn never(mut self) -> Self {
        self.results_after = None;
        self
    }

    pub fn missing(mut self, field: &'static str) -> Self {
        self.missing_field = Some(field);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_fill = true;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang_on_results = true;
        self
    }

    pub fn panicking_on_close(mut self) -> Self {
        self.panic_on_close = true;
        self
    }

    pub fn with(mut self, field: &'static str, value: &str) -> Self {
        self.values.insert(field, value.to_string());
        self
    }
}

/// 会话计数
#[derive(Debug, Default)]
pub struct SessionStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    /// 按关闭顺序记录的账号
    pub completions: Mutex<Vec<String>>,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn completions(&self) -> Vec<String> {
        self.completions.lock().clone()
    }
}

/// 脚本化会话工厂
pub struct MockSessionFactory {
    behaviors: Arc<HashMap<String, Behavior>>,
    input_visible: bool,
    fail_open_on: HashSet<usize>,
    panic_open_on: HashSet<usize>,
    open_attempts: AtomicUsize,
    pub stats: Arc<SessionStats>,
}

impl MockSessionFactory {
    pub fn new(behaviors: impl IntoIterator<Item = (&'static str, Behavior)>) -> Self {
        Self {
            behaviors: Arc::new(
                behaviors
                    .into_iter()
                    .map(|(handle, b)| (handle.to_string(), b))
                    .collect(),
            ),
            input_visible: true,
            fail_open_on: HashSet::new(),
            panic_open_on: HashSet::new(),
            open_attempts: AtomicUsize::new(0),
            stats: Arc::new(SessionStats::default()),
        }
    }

    /// 每个账号都是默认资料页
    pub fn profiles(handles: &[&'static str]) -> Self {
        Self::new(handles.iter().map(|h| (*h, Behavior::profile(h))))
    }

    /// 首页的输入框永远不出现
    pub fn unreachable(mut self) -> Self {
        self.input_visible = false;
        self
    }

    /// 第 n 次（从 1 开始）打开会话失败
    pub fn fail_open(mut self, attempt: usize) -> Self {
        self.fail_open_on.insert(attempt);
        self
    }

    /// 第 n 次（从 1 开始）打开会话时 panic
    pub fn panic_open(mut self, attempt: usize) -> Self {
        self.panic_open_on.insert(attempt);
        self
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, SessionError> {
        let attempt = self.open_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_open_on.contains(&attempt) {
            return Err(SessionError::Launch("chrome binary not found".to_string()));
        }
        if self.panic_open_on.contains(&attempt) {
            panic!("browser handler died on open attempt {}", attempt);
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            behaviors: self.behaviors.clone(),
            input_visible: self.input_visible,
            stats: self.stats.clone(),
            state: Mutex::new(None),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct Submitted {
    handle: String,
    behavior: Behavior,
    at: Option<Instant>,
}

struct MockSession {
    behaviors: Arc<HashMap<String, Behavior>>,
    input_visible: bool,
    stats: Arc<SessionStats>,
    state: Mutex<Option<Submitted>>,
}

impl MockSession {
    fn ready(&self) -> bool {
        let state = self.state.lock();
        match state.as_ref() {
            Some(Submitted {
                behavior,
                at: Some(at),
                ..
            }) => behavior
                .results_after
                .is_some_and(|delay| at.elapsed() >= delay),
            _ => false,
        }
    }

    fn hangs(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .is_some_and(|submitted| submitted.behavior.hang_on_results)
    }

    fn value(&self, field_id: &str) -> Result<String, SessionError> {
        let state = self.state.lock();
        let Some(submitted) = state.as_ref() else {
            return Err(SessionError::ElementNotFound(field_id.to_string()));
        };
        if submitted.behavior.missing_field == Some(field_id) {
            return Err(SessionError::ElementNotFound(field_id.to_string()));
        }
        Ok(submitted
            .behavior
            .values
            .get(field_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl Session for MockSession {
    async fn navigate(&self, _url: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn locate_and_fill(&self, field_id: &str, text: &str) -> Result<(), SessionError> {
        assert_eq!(field_id, fields::USERNAME_INPUT);
        let behavior = self
            .behaviors
            .get(text)
            .cloned()
            .unwrap_or_else(|| Behavior::profile(text));
        if behavior.panic_on_fill {
            panic!("renderer crashed while typing {}", text);
        }
        *self.state.lock() = Some(Submitted {
            handle: text.to_string(),
            behavior,
            at: None,
        });
        Ok(())
    }

    async fn click(&self, field_id: &str) -> Result<(), SessionError> {
        assert_eq!(field_id, fields::SEARCH_BUTTON);
        if let Some(submitted) = self.state.lock().as_mut() {
            submitted.at = Some(Instant::now());
        }
        Ok(())
    }

    async fn is_visible(&self, field_id: &str) -> Result<bool, SessionError> {
        match field_id {
            fields::USERNAME_INPUT => Ok(self.input_visible),
            fields::RESULTS_CARD => {
                if self.hangs() {
                    std::future::pending::<()>().await;
                }
                Ok(self.ready())
            }
            other => Ok(self.value(other).is_ok()),
        }
    }

    async fn read_text(&self, field_id: &str) -> Result<String, SessionError> {
        if !self.ready() {
            return Ok(String::new());
        }
        self.value(field_id)
    }

    async fn read_attribute(&self, field_id: &str, _name: &str) -> Result<String, SessionError> {
        self.value(field_id)
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        let mut panic_on_close = false;
        if let Some(submitted) = self.state.lock().as_ref() {
            self.stats.completions.lock().push(submitted.handle.clone());
            panic_on_close = submitted.behavior.panic_on_close;
        }
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
        if panic_on_close {
            panic!("page target vanished during close");
        }
        Ok(())
    }
}
