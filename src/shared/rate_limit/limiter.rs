use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::shared::errors::AuthError;
use crate::shared::utils::{Clock, SystemClock};

/// 요청 한도 판정 결과
/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Seconds until the oldest counted request leaves the window
    Denied { retry_after: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            RateDecision::Allowed => Ok(()),
            RateDecision::Denied { retry_after } => Err(AuthError::RateLimitExceeded { retry_after }),
        }
    }
}

/// 요청 한도 티어 (예: 분당 60회)
/// One window of a multi-tier limit. The tier name becomes part of the
/// counter key, so tiers never share counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitTier {
    pub name: String,
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl RateLimitTier {
    pub fn new(name: impl Into<String>, max_requests: u32, window_seconds: u64) -> Self {
        Self {
            name: name.into(),
            max_requests,
            window_seconds,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new("minute", max_requests, 60)
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self::new("hour", max_requests, 3_600)
    }

    pub fn per_day(max_requests: u32) -> Self {
        Self::new("day", max_requests, 86_400)
    }

    /// Prefix the tier name, e.g. `login:minute`
    pub fn scoped(mut self, scope: &str) -> Self {
        self.name = format!("{}:{}", scope, self.name);
        self
    }
}

/// (scope, identity); scope is empty for direct checks
type CounterKey = (String, String);

/// 슬라이딩 윈도우 요청 제한기
/// Sliding-window rate limiter.
///
/// Per key, an ordered list of `(timestamp, count)` entries. The whole
/// check (prune, sum, append) runs under one lock acquisition, so two
/// callers sharing an identity can never both observe "under limit" and
/// both append.
///
/// Single-process only. Sharing quotas across replicas needs a shared
/// atomic counter store behind the same methods.
pub struct RateLimiter {
    entries: Mutex<HashMap<CounterKey, Vec<(DateTime<Utc>, u32)>>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// 요청 한도 확인 후 기록
    /// Admit and count one request for `identity`, or deny it.
    pub fn check_and_record(
        &self,
        identity: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> RateDecision {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        Self::check_locked(
            &mut entries,
            (String::new(), identity.to_string()),
            max_requests,
            window_seconds,
            now,
        )
    }

    /// 여러 티어를 순서대로 확인 (첫 거부에서 중단)
    /// Evaluate tiers in order under separate keys. The first denial wins
    /// and later tiers are neither checked nor counted.
    pub fn check_tiers(&self, identity: &str, tiers: &[RateLimitTier]) -> RateDecision {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        for tier in tiers {
            let decision = Self::check_locked(
                &mut entries,
                (tier.name.clone(), identity.to_string()),
                tier.max_requests,
                tier.window_seconds,
                now,
            );
            if !decision.is_allowed() {
                return decision;
            }
        }

        RateDecision::Allowed
    }

    /// 관리자용 초기화: identity의 모든 카운터 삭제
    /// Administrative override: drop every counter of `identity`
    pub fn reset(&self, identity: &str) {
        self.entries.lock().retain(|(_, id), _| id != identity);
    }

    /// Number of counters currently held
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().len()
    }

    fn check_locked(
        entries: &mut HashMap<CounterKey, Vec<(DateTime<Utc>, u32)>>,
        key: CounterKey,
        max_requests: u32,
        window_seconds: u64,
        now: DateTime<Utc>,
    ) -> RateDecision {
        // 표현할 수 없는 윈도우는 최대값으로 고정
        let window = i64::try_from(window_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let cutoff = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let bucket = entries.entry(key.clone()).or_default();
        bucket.retain(|(ts, _)| *ts > cutoff);

        let used: u64 = bucket.iter().map(|(_, count)| u64::from(*count)).sum();
        if used < u64::from(max_requests) {
            bucket.push((now, 1));
            return RateDecision::Allowed;
        }

        let retry_after = match bucket.iter().map(|(ts, _)| *ts).min() {
            Some(oldest) => {
                let remaining = window - (now - oldest);
                (remaining.num_milliseconds().max(0) / 1000 + 1) as u64
            }
            None => window_seconds,
        };

        if bucket.is_empty() {
            entries.remove(&key);
        }
        RateDecision::Denied { retry_after }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::utils::ManualClock;

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (RateLimiter::with_clock(clock.clone()), clock)
    }

    #[test]
    fn allows_up_to_max_then_denies() {
        let (limiter, _) = limiter();

        for _ in 0..5 {
            assert!(limiter.check_and_record("1.2.3.4", 5, 60).is_allowed());
        }
        match limiter.check_and_record("1.2.3.4", 5, 60) {
            RateDecision::Denied { retry_after } => assert!(retry_after > 0),
            RateDecision::Allowed => panic!("sixth request must be denied"),
        }
    }

    #[test]
    fn retry_after_counts_down_from_oldest_entry() {
        let (limiter, clock) = limiter();

        assert!(limiter.check_and_record("id", 1, 60).is_allowed());
        clock.advance_secs(20);

        assert_eq!(
            limiter.check_and_record("id", 1, 60),
            RateDecision::Denied { retry_after: 41 }
        );
    }

    #[test]
    fn window_slides() {
        let (limiter, clock) = limiter();

        assert!(limiter.check_and_record("id", 2, 60).is_allowed());
        clock.advance_secs(30);
        assert!(limiter.check_and_record("id", 2, 60).is_allowed());
        assert!(!limiter.check_and_record("id", 2, 60).is_allowed());

        // 첫 요청만 윈도우 밖으로 밀려남
        clock.advance_secs(31);
        assert!(limiter.check_and_record("id", 2, 60).is_allowed());
        assert!(!limiter.check_and_record("id", 2, 60).is_allowed());
    }

    #[test]
    fn denials_are_not_counted() {
        let (limiter, clock) = limiter();

        assert!(limiter.check_and_record("id", 1, 10).is_allowed());
        for _ in 0..10 {
            assert!(!limiter.check_and_record("id", 1, 10).is_allowed());
        }

        clock.advance_secs(11);
        assert!(limiter.check_and_record("id", 1, 10).is_allowed());
    }

    #[test]
    fn zero_quota_denies_with_full_window() {
        let (limiter, _) = limiter();

        assert_eq!(
            limiter.check_and_record("id", 0, 60),
            RateDecision::Denied { retry_after: 60 }
        );
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn oversized_windows_do_not_overflow() {
        let (limiter, clock) = limiter();

        for window in [u64::MAX, i64::MAX as u64, i64::MAX as u64 / 1000 + 1] {
            let identity = format!("w{}", window);
            assert!(limiter.check_and_record(&identity, 1, window).is_allowed());

            clock.advance_secs(86_400);
            match limiter.check_and_record(&identity, 1, window) {
                RateDecision::Denied { retry_after } => assert!(retry_after > 86_400),
                RateDecision::Allowed => panic!("window of {}s must still hold the entry", window),
            }
        }
    }

    #[test]
    fn identities_are_independent() {
        let (limiter, _) = limiter();

        assert!(limiter.check_and_record("a", 1, 60).is_allowed());
        assert!(!limiter.check_and_record("a", 1, 60).is_allowed());
        assert!(limiter.check_and_record("b", 1, 60).is_allowed());
    }

    #[test]
    fn first_denying_tier_short_circuits() {
        let (limiter, _) = limiter();
        let tiers = [
            RateLimitTier::per_minute(2),
            RateLimitTier::per_hour(100),
        ];

        assert!(limiter.check_tiers("ip", &tiers).is_allowed());
        assert!(limiter.check_tiers("ip", &tiers).is_allowed());
        assert!(!limiter.check_tiers("ip", &tiers).is_allowed());
        assert!(!limiter.check_tiers("ip", &tiers).is_allowed());

        // hour 티어는 허용된 두 번만 기록됨
        let hour_only = [RateLimitTier::per_hour(3)];
        assert!(limiter.check_tiers("ip", &hour_only).is_allowed());
        assert!(!limiter.check_tiers("ip", &hour_only).is_allowed());
    }

    #[test]
    fn reset_clears_every_tier_of_an_identity() {
        let (limiter, _) = limiter();
        let tiers = [RateLimitTier::per_minute(1), RateLimitTier::per_day(1)];

        assert!(limiter.check_tiers("ip", &tiers).is_allowed());
        assert!(limiter.check_and_record("ip", 1, 60).is_allowed());
        assert!(limiter.check_tiers("other", &tiers).is_allowed());
        assert_eq!(limiter.tracked_keys(), 5);

        limiter.reset("ip");
        assert_eq!(limiter.tracked_keys(), 2);
        assert!(limiter.check_tiers("ip", &tiers).is_allowed());
    }

    #[test]
    fn expired_entries_are_pruned_on_access() {
        let (limiter, clock) = limiter();

        assert!(limiter.check_and_record("a", 1, 10).is_allowed());
        assert_eq!(limiter.tracked_keys(), 1);
        clock.advance_secs(11);

        // 만료된 항목은 정리되고 빈 키는 남지 않음
        assert!(!limiter.check_and_record("a", 0, 10).is_allowed());
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn concurrent_callers_never_exceed_quota() {
        let limiter = Arc::new(RateLimiter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|_| limiter.check_and_record("shared", 100, 60).is_allowed())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
    }
}
