//! 待機処理

use std::time::Duration;

/// ポーリングの待機を行うインターフェース
///
/// テストでは実時間を使わない実装に差し替える。
pub trait Sleeper {
    /// 指定時間待機する
    fn sleep(&mut self, duration: Duration);
}

/// `std::thread::sleep` で待機する
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
