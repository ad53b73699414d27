//! # Clock（時刻プロバイダ）
//!
//! 送信日時（`email_sent` / `sms_sent`）の記録で `Utc::now()` を直接呼ばず、
//! テストで固定時刻を注入できるようにするための抽象化。

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
   fn now(&self) -> DateTime<Utc>;
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
   fn now(&self) -> DateTime<Utc> {
      Utc::now()
   }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
   now: DateTime<Utc>,
}

impl FixedClock {
   pub fn new(now: DateTime<Utc>) -> Self {
      Self { now }
   }
}

impl Clock for FixedClock {
   fn now(&self) -> DateTime<Utc> {
      self.now
   }
}

/// 呼び出すたびに一定間隔で進むテスト用実装
///
/// 同じメッセージを繰り返し送信したとき、送信日時が上書きされることを
/// 検証するために使う。
pub struct SteppingClock {
   next: Mutex<DateTime<Utc>>,
   step: Duration,
}

impl SteppingClock {
   pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
      Self {
         next: Mutex::new(start),
         step,
      }
   }
}

impl Clock for SteppingClock {
   fn now(&self) -> DateTime<Utc> {
      let mut next = self.next.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
      let current = *next;
      *next = current + self.step;
      current
   }
}
