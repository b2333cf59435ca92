use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 協調的な停止フラグ
///
/// 有界な待機の合間にだけ確認される。実行中の待機を中断はしない。
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
