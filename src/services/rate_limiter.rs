//! 按客户端标识的每日请求限额
//!
//! 计数存储是可注入的窄接口；内存实现使用滑动过期：
//! 每次写入都把过期时间重置为「当前时间 + 24 小时」。

use crate::models::Usage;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const MAX_DAILY_REQUESTS: u32 = 100;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 计数存储，单个 key 的读写必须是原子的
pub trait CountingStore: Send + Sync {
    /// 当前计数，不存在或已过期为 0
    fn get(&self, key: &str) -> u32;
    /// 计数加一并刷新过期时间，返回新计数
    fn increment(&self, key: &str) -> u32;
}

struct CounterEntry {
    count: u32,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct CounterTable {
    entries: HashMap<String, CounterEntry>,
    next_purge: Option<DateTime<Utc>>,
}

pub struct MemoryCountingStore {
    table: Mutex<CounterTable>,
    ttl: Duration,
    purge_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryCountingStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(CounterTable::default()),
            ttl,
            // 过期记录按 ttl 的 1/24 清理一次，每日窗口即每小时
            purge_interval: ttl / 24,
            clock,
        }
    }

    pub fn daily() -> Self {
        Self::new(Duration::hours(24))
    }

    // 锁中毒时继续使用内部数据
    fn lock_table(&self) -> MutexGuard<'_, CounterTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CountingStore for MemoryCountingStore {
    fn get(&self, key: &str) -> u32 {
        let now = self.clock.now();
        let mut table = self.lock_table();
        match table.entries.get(key) {
            Some(entry) if entry.expires_at > now => entry.count,
            Some(_) => {
                table.entries.remove(key);
                0
            }
            None => 0,
        }
    }

    fn increment(&self, key: &str) -> u32 {
        let now = self.clock.now();
        let mut table = self.lock_table();

        // 定期顺带清理过期记录，避免 map 无限增长
        let next_purge = *table.next_purge.get_or_insert(now + self.purge_interval);
        if now >= next_purge {
            table.entries.retain(|_, entry| entry.expires_at > now);
            table.next_purge = Some(now + self.purge_interval);
        }

        let entry = table.entries.entry(key.to_string()).or_insert(CounterEntry {
            count: 0,
            expires_at: now,
        });
        entry.count = entry.count.saturating_add(1);
        entry.expires_at = now + self.ttl;
        entry.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// `check_and_consume` 的结果
#[derive(Debug)]
pub enum Admission<T, E> {
    /// 已达上限，未执行操作，也未消耗额度
    Rejected { usage: Usage },
    /// 操作成功并消耗了一次额度
    Completed { value: T, usage: Usage },
    /// 操作失败，未消耗额度
    Failed { error: E, usage: Usage },
}

pub struct RateLimiter {
    store: Arc<dyn CountingStore>,
    ceiling: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CountingStore>, ceiling: u32) -> Self {
        Self { store, ceiling }
    }

    /// 只读检查，不消耗额度
    pub fn check(&self, client_id: &str) -> RateDecision {
        let count = self.store.get(client_id);
        RateDecision {
            allowed: count < self.ceiling,
            remaining: self.ceiling.saturating_sub(count),
        }
    }

    /// 消耗一次额度，返回剩余次数（不小于 0）
    pub fn consume(&self, client_id: &str) -> RateDecision {
        let count = self.store.increment(client_id);
        RateDecision {
            allowed: true,
            remaining: self.ceiling.saturating_sub(count),
        }
    }

    pub fn usage(&self, client_id: &str) -> Usage {
        Usage {
            remaining: self.check(client_id).remaining,
            limit: self.ceiling,
        }
    }

    /// 先检查额度，未超限时执行 `op`，仅在 `op` 成功后消耗一次额度
    ///
    /// 同一客户端的并发请求在检查和消耗之间可能超出上限，超出量不超过在途请求数。
    pub async fn check_and_consume<T, E, F, Fut>(&self, client_id: &str, op: F) -> Admission<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let decision = self.check(client_id);
        if !decision.allowed {
            return Admission::Rejected {
                usage: Usage {
                    remaining: 0,
                    limit: self.ceiling,
                },
            };
        }

        match op().await {
            Ok(value) => {
                let consumed = self.consume(client_id);
                Admission::Completed {
                    value,
                    usage: Usage {
                        remaining: consumed.remaining,
                        limit: self.ceiling,
                    },
                }
            }
            Err(error) => Admission::Failed {
                error,
                usage: self.usage(client_id),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 手动推进的时钟
    pub(crate) struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc::now()),
            })
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn limiter(ceiling: u32) -> (RateLimiter, Arc<ManualClock>, Arc<MemoryCountingStore>) {
        let clock = ManualClock::new();
        let store = Arc::new(MemoryCountingStore::with_clock(Duration::hours(24), clock.clone()));
        (RateLimiter::new(store.clone(), ceiling), clock, store)
    }

    #[test]
    fn test_store_sliding_expiry() {
        let clock = ManualClock::new();
        let store = MemoryCountingStore::with_clock(Duration::hours(24), clock.clone());

        assert_eq!(store.get("a"), 0);
        assert_eq!(store.increment("a"), 1);

        clock.advance(Duration::hours(20));
        assert_eq!(store.increment("a"), 2);

        // 距第一次写入已超过 24 小时，但距最后一次写入没有
        clock.advance(Duration::hours(20));
        assert_eq!(store.get("a"), 2);

        clock.advance(Duration::hours(5));
        assert_eq!(store.get("a"), 0);
        assert_eq!(store.increment("a"), 1);
    }

    #[test]
    fn test_store_purges_expired_entries() {
        let clock = ManualClock::new();
        let store = MemoryCountingStore::with_clock(Duration::hours(24), clock.clone());
        store.increment("a");
        store.increment("b");
        assert_eq!(store.table.lock().unwrap().entries.len(), 2);

        clock.advance(Duration::hours(25));
        store.increment("c");
        assert_eq!(store.table.lock().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_store_purge_waits_for_interval() {
        let clock = ManualClock::new();
        let store = MemoryCountingStore::with_clock(Duration::hours(24), clock.clone());
        store.increment("a");

        clock.advance(Duration::minutes(23 * 60 + 30));
        store.increment("b");
        assert_eq!(store.table.lock().unwrap().entries.len(), 2);

        // "a" 已过期，但距上次清理不足一小时，写入时不扫描
        clock.advance(Duration::minutes(45));
        store.increment("c");
        assert_eq!(store.table.lock().unwrap().entries.len(), 3);
        assert_eq!(store.get("a"), 0);
        assert_eq!(store.table.lock().unwrap().entries.len(), 2);

        clock.advance(Duration::hours(25));
        store.increment("d");
        assert_eq!(store.table.lock().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_check_does_not_consume() {
        let (limiter, _, store) = limiter(3);
        assert_eq!(limiter.check("a"), RateDecision { allowed: true, remaining: 3 });
        assert_eq!(limiter.check("a"), RateDecision { allowed: true, remaining: 3 });
        assert_eq!(store.get("a"), 0);

        assert_eq!(limiter.consume("a").remaining, 2);
        assert_eq!(limiter.usage("a"), Usage { remaining: 2, limit: 3 });
    }

    #[tokio::test]
    async fn test_ceiling_rejects_without_consuming() {
        let (limiter, _, store) = limiter(2);

        for expected in [1, 0] {
            match limiter.check_and_consume("a", || async { Ok::<_, ()>("tree") }).await {
                Admission::Completed { value, usage } => {
                    assert_eq!(value, "tree");
                    assert_eq!(usage, Usage { remaining: expected, limit: 2 });
                }
                other => panic!("expected Completed, got {:?}", other),
            }
        }

        let mut ran = false;
        let outcome = limiter
            .check_and_consume("a", || {
                ran = true;
                async { Ok::<_, ()>("tree") }
            })
            .await;
        assert!(matches!(outcome, Admission::Rejected { usage } if usage.remaining == 0 && usage.limit == 2));
        assert!(!ran);
        assert_eq!(store.get("a"), 2);

        // 其他客户端不受影响
        assert!(matches!(
            limiter.check_and_consume("b", || async { Ok::<_, ()>(()) }).await,
            Admission::Completed { usage, .. } if usage.remaining == 1
        ));
    }

    #[tokio::test]
    async fn test_failed_operation_does_not_consume() {
        let (limiter, _, store) = limiter(5);
        let outcome = limiter
            .check_and_consume("a", || async { Err::<(), _>("upstream down") })
            .await;
        match outcome {
            Admission::Failed { error, usage } => {
                assert_eq!(error, "upstream down");
                assert_eq!(usage, Usage { remaining: 5, limit: 5 });
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(store.get("a"), 0);
    }

    #[tokio::test]
    async fn test_budget_returns_after_window() {
        let (limiter, clock, _) = limiter(1);
        assert!(matches!(
            limiter.check_and_consume("a", || async { Ok::<_, ()>(()) }).await,
            Admission::Completed { .. }
        ));
        assert!(!limiter.check("a").allowed);

        clock.advance(Duration::hours(24) + Duration::seconds(1));
        assert!(limiter.check("a").allowed);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryCountingStore::daily());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.increment("shared");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get("shared"), 800);
    }
}
