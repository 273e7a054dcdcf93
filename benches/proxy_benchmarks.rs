use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use stringsvc::config::{ProxyConfig, StringSvcConfig};
use stringsvc::endpoint::{endpoint_fn, BoxEndpoint};
use stringsvc::error::ProxyError;
use stringsvc::loadbalancer::{InstancePool, LoadBalancer, PoolMember};
use stringsvc::rate_limit::RateLimitConfig;
use stringsvc::service::{BasicStringService, ProxyingMiddleware, UppercaseEndpoint};
use stringsvc::transport::{UppercaseRequest, UppercaseResponse};

fn echo_pool(size: usize) -> InstancePool<String, String> {
    let members = (0..size)
        .map(|i| {
            let endpoint: BoxEndpoint<String, String> =
                Arc::new(endpoint_fn(|s: String| async move { Ok::<_, ProxyError>(s) }));
            PoolMember::new(format!("instance-{}", i), endpoint)
        })
        .collect();
    InstancePool::new(members).expect("Failed to create pool")
}

fn benchmark_balancer_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("balancer_next");

    for size in [1, 3, 10, 100].iter() {
        let balancer = LoadBalancer::round_robin(echo_pool(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &_size| {
            b.iter(|| black_box(balancer.next().map(|m| m.name().len())))
        });
    }
    group.finish();
}

fn benchmark_proxied_uppercase(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");

    // Generous limits so the bucket never empties during the run
    let config = ProxyConfig {
        rate_limit: RateLimitConfig::per_second(1_000_000),
        ..Default::default()
    };
    let middleware = ProxyingMiddleware::new("a,b,c", &config, |_| {
        let endpoint: UppercaseEndpoint = Arc::new(endpoint_fn(|req: UppercaseRequest| async move {
            Ok::<_, ProxyError>(UppercaseResponse::ok(req.s.to_uppercase()))
        }));
        Ok(endpoint)
    })
    .expect("Failed to build proxy");
    let svc = middleware.wrap(Arc::new(BasicStringService));

    c.bench_function("proxied_uppercase", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(svc.uppercase("hello".to_string()).await) })
    });
}

fn benchmark_config_parsing(c: &mut Criterion) {
    let yaml = r#"
server:
  host: "0.0.0.0"
  port: 8080

proxy:
  instances: "localhost:8001,localhost:8002,localhost:8003"
  rate_limit:
    qps: 100
  retry:
    max_attempts: 3
    max_elapsed_ms: 250
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| black_box(StringSvcConfig::from_yaml(yaml)))
    });
}

criterion_group!(
    benches,
    benchmark_balancer_next,
    benchmark_proxied_uppercase,
    benchmark_config_parsing
);
criterion_main!(benches);
