//! WorkerPool - 同時実行数に上限のあるタスク実行
//!
//! # フロー
//! 1. items を共有キュー（VecDeque）に積む
//! 2. `min(limit, items.len())` 本のワーカーを spawn
//! 3. 各ワーカーはキューから 1 件取り出し、handler を別タスクで実行して完了を待つ
//! 4. 完了（成功・失敗・panic）は mpsc チャネルで報告
//! 5. 全ワーカーの送信側が drop されたら run() が返る
//!
//! ワーカー数が上限なので、同時に in-flight なタスクは常に `limit` 以下。
//! 1 件の失敗は他のタスクにもプール自体にも波及しない。

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
}

/// Why a task did not produce an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    Error(String),
    Panicked(String),
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Error(msg) => write!(f, "task failed: {msg}"),
            TaskFailure::Panicked(msg) => write!(f, "task panicked: {msg}"),
        }
    }
}

/// One finished task.
#[derive(Debug)]
pub struct Completion<I, O> {
    pub worker_id: usize,
    pub item: I,
    pub result: Result<O, TaskFailure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    pub workers: usize,
    pub launched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub peak_in_flight: usize,
}

/// Result of one `WorkerPool::run`. Completions are in completion order.
#[derive(Debug)]
pub struct PoolRun<I, O> {
    pub completions: Vec<Completion<I, O>>,
    pub report: PoolReport,
}

#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    launched: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fixed-size set of workers pulling from a shared queue.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    limit: NonZeroUsize,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Result<Self, PoolError> {
        NonZeroUsize::new(limit)
            .map(|limit| Self { limit })
            .ok_or(PoolError::ZeroConcurrency)
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Runs `handler` once per item and waits until every item has completed.
    pub async fn run<I, O, E, F, Fut>(&self, items: Vec<I>, handler: F) -> PoolRun<I, O>
    where
        I: Clone + Send + 'static,
        O: Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let total = items.len();
        let workers = self.limit.get().min(total);
        let queue = Arc::new(Mutex::new(VecDeque::from(items)));
        let handler = Arc::new(handler);
        let gauge = Arc::new(Gauge::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        debug!(total, workers, limit = self.limit.get(), "starting worker pool");

        let mut joins = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            joins.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&handler),
                Arc::clone(&gauge),
                tx.clone(),
            )));
        }
        // 各ワーカーが持つ送信側だけが残るようにする
        drop(tx);

        let mut completions = Vec::with_capacity(total);
        while let Some(completion) = rx.recv().await {
            completions.push(completion);
        }
        for join in joins {
            if let Err(e) = join.await {
                warn!(error = %e, "worker ended abnormally");
            }
        }

        let failed = completions.iter().filter(|c| c.result.is_err()).count();
        let report = PoolReport {
            workers,
            launched: gauge.launched.load(Ordering::SeqCst),
            succeeded: completions.len() - failed,
            failed,
            peak_in_flight: gauge.peak.load(Ordering::SeqCst),
        };
        debug!(?report, "worker pool finished");

        PoolRun {
            completions,
            report,
        }
    }
}

async fn worker_loop<I, O, E, F, Fut>(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<I>>>,
    handler: Arc<F>,
    gauge: Arc<Gauge>,
    tx: mpsc::UnboundedSender<Completion<I, O>>,
) where
    I: Clone + Send + 'static,
    O: Send + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
{
    loop {
        // ロックは取り出しの間だけ。await を跨いで保持しない
        let Some(item) = queue.lock().await.pop_front() else {
            break;
        };

        gauge.enter();
        let task = tokio::spawn((handler.as_ref())(item.clone()));
        let result = match task.await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                warn!(worker_id, error = %err, "task failed");
                Err(TaskFailure::Error(err.to_string()))
            }
            Err(join_err) => {
                warn!(worker_id, error = %join_err, "task panicked");
                Err(TaskFailure::Panicked(join_err.to_string()))
            }
        };
        gauge.leave();

        if tx
            .send(Completion {
                worker_id,
                item,
                result,
            })
            .is_err()
        {
            // 受信側が無いなら続けても意味がない
            break;
        }
    }
}
