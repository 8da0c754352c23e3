//! Adaptive Throttler Example
//!
//! This example demonstrates probabilistic, success-rate-driven load
//! shedding with the plain throttler, and priority-aware admission using a
//! prioritizer shared by several request classes.
//!
//! Run with: cargo run --example adaptive

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::{Service, ServiceBuilder, ServiceExt};
use tower_resilience_adaptive::{AdaptiveError, AdaptiveThrottleLayer};
use tower_resilience_core::{PriorityLevel, RejectionThreshold};
use tower_resilience_prioritizer::PrioritizerConfigBuilder;

#[derive(Clone)]
struct FlakyBackend {
    failure_count: Arc<AtomicUsize>,
}

impl FlakyBackend {
    fn new() -> Self {
        Self {
            failure_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Service<u64> for FlakyBackend {
    type Response = String;
    type Error = &'static str;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: u64) -> Self::Future {
        let failures = Arc::clone(&self.failure_count);
        Box::pin(async move {
            // Simulate a backend that degrades under its own load, failing
            // 60% of requests.
            if req % 5 < 3 {
                failures.fetch_add(1, Ordering::Relaxed);
                Err("backend overloaded")
            } else {
                Ok(format!("processed {req}"))
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Adaptive Throttler Example ===\n");

    println!("--- Plain throttler ---");
    println!("Sheds load probabilistically once recent failures outrun");
    println!("`success_rate_threshold`; a backend stuck at 40% success drives");
    println!("the throttle probability up toward its configured cap.\n");

    let layer = AdaptiveThrottleLayer::builder()
        .success_rate_threshold(0.9)
        .max_rejection_probability(0.8)
        .request_padding(1)
        .build();
    let throttle = layer.throttle();

    let mut service = ServiceBuilder::new().layer(layer).service(FlakyBackend::new());

    let mut admitted = 0;
    let mut shed = 0;
    let mut backend_errors = 0;

    for i in 0..200u64 {
        match service.ready().await?.call(i).await {
            Ok(_) => admitted += 1,
            Err(AdaptiveError::Exceeded) => shed += 1,
            Err(AdaptiveError::Inner(_)) => backend_errors += 1,
        }
    }

    println!(
        "admitted={admitted} shed={shed} backend_errors={backend_errors} \
         final throttle_probability={:.3}",
        throttle.throttle_probability()
    );

    println!("\n--- Priority-aware throttler ---");
    println!("A shared prioritizer calibrates a rejection threshold from the");
    println!("throttler's own stats; Critical traffic keeps flowing even as");
    println!("Low-priority traffic is shed first under the same pressure.\n");

    let prioritizer = PrioritizerConfigBuilder::new()
        .calibration_interval(Duration::from_millis(50))
        .build();

    #[derive(Clone, Copy)]
    struct PriorityRequest {
        id: u64,
        priority: PriorityLevel,
    }

    let priority_layer = AdaptiveThrottleLayer::builder()
        .success_rate_threshold(0.9)
        .max_rejection_probability(0.95)
        .build_with_priority(prioritizer.clone(), |req: &PriorityRequest| req.priority);
    prioritizer.register(priority_layer.throttle());

    let mut priority_service = ServiceBuilder::new()
        .layer(priority_layer)
        .service(tower::service_fn(move |req: PriorityRequest| {
            let mut backend = FlakyBackend::new();
            async move { backend.call(req.id).await }
        }));

    let mut low_admitted = 0;
    let mut low_total = 0;
    let mut critical_admitted = 0;
    let mut critical_total = 0;

    for i in 0..200u64 {
        let low = PriorityRequest {
            id: i,
            priority: PriorityLevel::Low,
        };
        let critical = PriorityRequest {
            id: i,
            priority: PriorityLevel::Critical,
        };

        low_total += 1;
        if priority_service.ready().await?.call(low).await.is_ok() {
            low_admitted += 1;
        }

        critical_total += 1;
        if priority_service.ready().await?.call(critical).await.is_ok() {
            critical_admitted += 1;
        }

        if i % 25 == 0 {
            prioritizer.calibrate();
        }
    }

    println!(
        "Low priority: {low_admitted}/{low_total} admitted; \
         Critical priority: {critical_admitted}/{critical_total} admitted"
    );
    println!(
        "Calibrated rejection threshold: {}",
        prioritizer.rejection_threshold()
    );

    Ok(())
}
