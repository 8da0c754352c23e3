//! Adaptive throttler stress tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tower::{Service, ServiceBuilder, ServiceExt};
use tower_resilience_adaptive::{AdaptiveError, AdaptiveThrottleLayer};

use super::ConcurrencyTracker;

/// Test: High volume sequential calls against an all-success backend.
///
/// With only successes recorded, `rejectProbability` stays at 0, so every
/// call should be admitted regardless of volume.
#[tokio::test]
#[ignore]
async fn stress_sequential_high_volume_all_success() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = tower::service_fn(move |req: u64| {
        let count = cc.clone();
        async move {
            count.fetch_add(1, Ordering::Relaxed);
            Ok::<_, &str>(req * 2)
        }
    });

    let mut service = ServiceBuilder::new()
        .layer(AdaptiveThrottleLayer::builder().max_rejection_probability(0.9).build())
        .service(svc);

    let start = Instant::now();
    let mut admitted = 0usize;

    for i in 0..100_000 {
        match service.ready().await.unwrap().call(i).await {
            Ok(_) => admitted += 1,
            Err(AdaptiveError::Exceeded) => {}
            Err(AdaptiveError::Inner(_)) => panic!("backend never errors"),
        }
    }

    let elapsed = start.elapsed();
    let actual_calls = call_count.load(Ordering::Relaxed);

    println!("100k sequential calls in {:?}", elapsed);
    println!("Admitted: {admitted}, backend calls: {actual_calls}");

    assert_eq!(admitted, actual_calls);
    assert_eq!(actual_calls, 100_000);
}

/// Test: High concurrency against an all-success backend; none are shed.
#[tokio::test]
#[ignore]
async fn stress_high_concurrency_all_success() {
    let tracker = ConcurrencyTracker::new();
    let call_count = Arc::new(AtomicUsize::new(0));
    let tracker_clone = Arc::clone(&tracker);
    let cc = Arc::clone(&call_count);

    let svc = tower::service_fn(move |_req: ()| {
        let tracker = Arc::clone(&tracker_clone);
        let count = cc.clone();
        async move {
            tracker.enter();
            count.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_millis(2)).await;
            tracker.exit();
            Ok::<_, &str>(())
        }
    });

    let service = ServiceBuilder::new()
        .layer(AdaptiveThrottleLayer::builder().build())
        .service(svc);

    let start = Instant::now();
    let mut handles = vec![];

    for _ in 0..1000 {
        let mut svc = service.clone();
        handles.push(tokio::spawn(async move {
            svc.ready().await.unwrap().call(()).await
        }));
    }

    let mut admitted = 0usize;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            admitted += 1;
        }
    }

    let elapsed = start.elapsed();
    println!("1000 concurrent requests in {:?}, admitted {admitted}", elapsed);
    assert_eq!(admitted, 1000);
}

/// Test: Sustained failures drive `throttle_probability` toward its cap and
/// cause rejections to appear.
#[tokio::test]
#[ignore]
async fn stress_sustained_failure_shedding() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = tower::service_fn(move |_req: ()| {
        let count = cc.clone();
        async move {
            count.fetch_add(1, Ordering::Relaxed);
            Err::<(), _>("backend down")
        }
    });

    let layer = AdaptiveThrottleLayer::builder()
        .max_rejection_probability(1.0)
        .success_rate_threshold(0.9)
        .build();
    let throttle = layer.throttle();
    let mut service = layer.layer(svc);

    let mut exceeded = 0usize;
    let mut inner_errors = 0usize;

    for _ in 0..5000 {
        match service.ready().await.unwrap().call(()).await {
            Ok(()) => unreachable!("backend always fails"),
            Err(AdaptiveError::Exceeded) => exceeded += 1,
            Err(AdaptiveError::Inner(_)) => inner_errors += 1,
        }
    }

    println!(
        "After 5000 sustained failures: exceeded={exceeded}, inner_errors={inner_errors}, \
         throttle_probability={}",
        throttle.throttle_probability()
    );

    assert!(exceeded > 0, "shedding never kicked in under sustained failures");
    assert!(throttle.throttle_probability() >= 0.9);
}

/// Test: Memory/handle stability under a long burst of mixed outcomes.
#[tokio::test]
#[ignore]
async fn stress_memory_stability() {
    let svc = tower::service_fn(|flip: bool| async move {
        if flip {
            Err::<(), _>("flaky")
        } else {
            Ok(())
        }
    });

    let service = ServiceBuilder::new()
        .layer(AdaptiveThrottleLayer::builder().build())
        .service(svc);

    let start = Instant::now();
    let mut total_requests = 0u64;

    while start.elapsed() < Duration::from_secs(3) {
        let mut handles = vec![];
        for i in 0..100 {
            let mut svc = service.clone();
            handles.push(tokio::spawn(async move {
                let _ = svc.ready().await.unwrap().call(i % 5 == 0).await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
        total_requests += 100;
    }

    println!("Ran {total_requests} requests over 3 seconds without panics or deadlocks");
}
