use super::errors::DispatchError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

/// 同時実行スロット数の既定値
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// ワーカープール
///
/// ブロッキングなポーリングループから非同期のリポジトリ処理を呼ぶための橋渡し。
/// タスクはサービス共通のtokioランタイム上で実行され、
/// 同時実行数はセマフォで`size`に制限される。
///
/// 呼び出し元はtokioのワーカースレッドであってはならない
/// （`Handle::block_on`で完了を待つため）。
/// また、ランタイムはマルチスレッドである必要がある。
pub struct WorkerPool {
    runtime: Handle,
    permits: Arc<Semaphore>,
    size: usize,
    accepting: AtomicBool,
}

impl WorkerPool {
    pub fn new(runtime: Handle, size: usize) -> Self {
        let size = size.max(1);
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(size)),
            size,
            accepting: AtomicBool::new(true),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 実行中のタスク数
    pub fn in_flight(&self) -> usize {
        if self.permits.is_closed() {
            return 0;
        }
        self.size - self.permits.available_permits()
    }

    /// ハンドラーを投入し、完了まで（最大`timeout`）ブロックする
    ///
    /// タイムアウトはエラー結果として返し、実行中のタスクはキャンセルしない。
    ///
    /// # エラー
    /// - `ShutDown`: 停止済み
    /// - `Timeout`: `timeout`内に完了しなかった
    /// - `Handler`: ハンドラーがエラーを返した
    /// - `Panicked`: ハンドラーがパニックした
    pub fn submit<A, F, Fut, T, E>(
        &self,
        handler: F,
        arg: A,
        timeout: Duration,
    ) -> Result<T, DispatchError>
    where
        A: Send + 'static,
        F: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(DispatchError::ShutDown);
        }

        let permits = Arc::clone(&self.permits);
        let task = self.runtime.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::ShutDown)?;
            handler(arg)
                .await
                .map_err(|e| DispatchError::Handler(Box::new(e)))
        });

        // タイマーはランタイムのコンテキスト内で作る必要がある
        let outcome = self
            .runtime
            .block_on(async move { tokio::time::timeout(timeout, task).await });

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(DispatchError::Panicked(join_error.to_string())),
            Err(_) => Err(DispatchError::Timeout(timeout)),
        }
    }

    /// 新規受付を止め、実行中のタスクがすべて終わるまで待つ
    ///
    /// 実行中のタスクはキャンセルしない。2回目以降は何もしない。
    pub fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }

        let in_flight = self.in_flight();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for in-flight handlers");
        }

        let permits = Arc::clone(&self.permits);
        let size = self.size as u32;
        self.runtime.block_on(async move {
            // 全スロットが返却されるまで待つ
            if let Ok(all) = permits.acquire_many(size).await {
                drop(all);
            }
            permits.close();
        });

        tracing::info!("Worker pool shut down");
    }
}
