use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use auth_server::shared::rate_limit::{RateLimitPolicy, RateLimiter};

const IDENTITY_COUNTS: [usize; 3] = [1, 100, 10_000];

// 단일 스레드: identity 수에 따른 판정 비용
fn bench_check_and_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_and_record");

    for &identities in IDENTITY_COUNTS.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(identities),
            &identities,
            |b, &count| {
                let limiter = RateLimiter::new();
                let keys: Vec<String> = (0..count)
                    .map(|i| format!("10.0.{}.{}", i / 256, i % 256))
                    .collect();
                let mut i = 0usize;

                b.iter(|| {
                    let key = &keys[i % keys.len()];
                    i = i.wrapping_add(1);
                    black_box(limiter.check_and_record(key, 100, 60))
                });
            },
        );
    }

    group.finish();
}

// 전역 + 엔드포인트 티어 (미들웨어와 동일한 경로)
fn bench_policy_tiers(c: &mut Criterion) {
    let limiter = RateLimiter::new();
    let policy = RateLimitPolicy::default();
    let login = policy
        .endpoint_tiers(&axum::http::Method::POST, "/api/auth/login")
        .map(<[_]>::to_vec)
        .unwrap_or_default();

    c.bench_function("global_and_login_tiers", |b| {
        let mut i = 0u32;
        b.iter(|| {
            let identity = format!("192.168.0.{}", i % 250);
            i = i.wrapping_add(1);
            black_box(limiter.check_tiers(&identity, &policy.global));
            black_box(limiter.check_tiers(&identity, &login))
        });
    });
}

// 여러 스레드가 같은 limiter를 공유할 때
fn bench_contended(c: &mut Criterion) {
    c.bench_function("contended_8_threads_x_1000", |b| {
        b.iter(|| {
            let limiter = Arc::new(RateLimiter::new());
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let limiter = limiter.clone();
                    thread::spawn(move || {
                        let identity = format!("client-{}", t % 4);
                        for _ in 0..1_000 {
                            black_box(limiter.check_and_record(&identity, 500, 60));
                        }
                    })
                })
                .collect();

            for handle in handles {
                let _ = handle.join();
            }
        });
    });
}

criterion_group!(benches, bench_check_and_record, bench_policy_tiers, bench_contended);
criterion_main!(benches);
