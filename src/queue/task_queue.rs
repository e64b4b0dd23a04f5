// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// 任务队列特质
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 出队任务，队列耗尽时返回 `None`
    async fn dequeue(&self, worker_id: usize) -> Option<Task>;

    /// 剩余任务数
    fn remaining(&self) -> usize;
}

/// 内存任务队列
///
/// 按输入顺序出队，每个任务只会被一个 worker 取走一次
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl InMemoryTaskQueue {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into_iter().collect()),
        }
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn dequeue(&self, worker_id: usize) -> Option<Task> {
        let task = self.tasks.lock().pop_front();
        if let Some(task) = &task {
            tracing::trace!(worker_id, index = task.index, "Task dequeued");
        }
        task
    }

    fn remaining(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[async_trait]
impl<T: TaskQueue + ?Sized> TaskQueue for Arc<T> {
    async fn dequeue(&self, worker_id: usize) -> Option<Task> {
        (**self).dequeue(worker_id).await
    }

    fn remaining(&self) -> usize {
        (**self).remaining()
    }
}
