use super::StringService;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerEndpoint, CircuitState};
use crate::config::ProxyConfig;
use crate::endpoint::BoxEndpoint;
use crate::error::{ProxyError, Result};
use crate::instance::{split_instances, Instance};
use crate::loadbalancer::{InstancePool, LoadBalancer, LoadBalancingStrategy, PoolMember};
use crate::rate_limit::{RateLimitedEndpoint, TokenBucket};
use crate::retry::RetryingDispatcher;
use crate::transport::codec::{decode_json_response, encode_json_request};
use crate::transport::{
    HttpTransport, TransportEndpoint, UppercaseRequest, UppercaseResponse, UPPERCASE_OPERATION,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Unprotected endpoint for the uppercase operation on one instance
pub type UppercaseEndpoint = BoxEndpoint<UppercaseRequest, UppercaseResponse>;

/// Dispatcher and breakers shared by every service the middleware wraps
pub struct ProxyPool {
    dispatcher: RetryingDispatcher<UppercaseRequest, UppercaseResponse>,
    breakers: Vec<Arc<CircuitBreaker>>,
}

impl ProxyPool {
    fn breaker_states(&self) -> Vec<(String, CircuitState)> {
        self.breakers
            .iter()
            .map(|b| (b.instance().to_string(), b.state()))
            .collect()
    }
}

/// Decorator factory routing `uppercase` to a pool of remote instances
pub enum ProxyingMiddleware {
    /// No instances configured; services are returned unwrapped
    Disabled,
    Enabled(Arc<ProxyPool>),
}

impl ProxyingMiddleware {
    /// Build the proxy from a comma-separated instance list.
    ///
    /// Each instance gets an endpoint from `factory`, guarded by its own
    /// circuit breaker with its own rate limiter in front. An empty list
    /// disables proxying without calling `factory`.
    pub fn new<F>(instances: &str, config: &ProxyConfig, factory: F) -> Result<Self>
    where
        F: Fn(&Instance) -> Result<UppercaseEndpoint>,
    {
        let addresses = split_instances(instances);
        if addresses.is_empty() {
            info!(proxy_to = "none", "Proxying disabled");
            return Ok(ProxyingMiddleware::Disabled);
        }

        let mut members = Vec::with_capacity(addresses.len());
        let mut breakers = Vec::with_capacity(addresses.len());
        for address in &addresses {
            let instance = Instance::parse(address, UPPERCASE_OPERATION)?;
            let unit = factory(&instance)?;

            let breaker = Arc::new(CircuitBreaker::new(
                instance.address(),
                config.circuit_breaker.clone(),
            ));
            let guarded: UppercaseEndpoint =
                Arc::new(CircuitBreakerEndpoint::new(breaker.clone(), unit));

            let bucket = TokenBucket::new(config.rate_limit.clone())?;
            let limited: UppercaseEndpoint =
                Arc::new(RateLimitedEndpoint::new(instance.address(), bucket, guarded));

            members.push(PoolMember::new(instance.address(), limited));
            breakers.push(breaker);
        }

        let pool = InstancePool::new(members)?;
        info!(proxy_to = ?pool.names(), strategy = ?config.strategy, "Proxying enabled");

        let balancer = LoadBalancer::new(pool, LoadBalancingStrategy::from_kind(config.strategy));
        let dispatcher = RetryingDispatcher::new(balancer, config.retry.clone());

        Ok(ProxyingMiddleware::Enabled(Arc::new(ProxyPool {
            dispatcher,
            breakers,
        })))
    }

    /// Build the proxy over JSON-over-HTTP instance endpoints
    pub fn http(instances: &str, config: &ProxyConfig) -> Result<Self> {
        let client = HttpTransport::client()?;
        let request_timeout = config.request_timeout();

        Self::new(instances, config, |instance| {
            let transport = Arc::new(HttpTransport::new(client.clone(), instance, request_timeout));
            let endpoint: UppercaseEndpoint = Arc::new(TransportEndpoint::new(
                transport,
                encode_json_request::<UppercaseRequest>,
                decode_json_response::<UppercaseResponse>,
            ));
            Ok(endpoint)
        })
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ProxyingMiddleware::Enabled(_))
    }

    /// Current breaker state of every instance, in pool order
    pub fn breaker_states(&self) -> Vec<(String, CircuitState)> {
        match self {
            ProxyingMiddleware::Disabled => Vec::new(),
            ProxyingMiddleware::Enabled(pool) => pool.breaker_states(),
        }
    }

    /// Wrap `next`, or return it untouched when proxying is disabled
    pub fn wrap(&self, next: Arc<dyn StringService>) -> Arc<dyn StringService> {
        match self {
            ProxyingMiddleware::Disabled => next,
            ProxyingMiddleware::Enabled(pool) => Arc::new(ProxyingService {
                next,
                pool: pool.clone(),
            }),
        }
    }
}

/// String service whose `uppercase` is served by remote instances
pub struct ProxyingService {
    next: Arc<dyn StringService>,
    pool: Arc<ProxyPool>,
}

impl ProxyingService {
    /// Current breaker state of every instance, in pool order
    pub fn breaker_states(&self) -> Vec<(String, CircuitState)> {
        self.pool.breaker_states()
    }
}

#[async_trait]
impl StringService for ProxyingService {
    async fn uppercase(&self, s: String) -> Result<String> {
        let response = self.pool.dispatcher.invoke(UppercaseRequest { s }).await?;
        if !response.err.is_empty() {
            return Err(ProxyError::Remote(response.err));
        }
        Ok(response.v)
    }

    fn count(&self, s: &str) -> usize {
        self.next.count(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::endpoint_fn;
    use crate::service::BasicStringService;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn healthy(_instance: &Instance) -> Result<UppercaseEndpoint> {
        Ok(Arc::new(endpoint_fn(|req: UppercaseRequest| async move {
            Ok::<_, ProxyError>(UppercaseResponse::ok(format!(
                "remote:{}",
                req.s.to_uppercase()
            )))
        })))
    }

    #[test]
    fn test_empty_config_disables_proxy() {
        let built = AtomicUsize::new(0);
        for instances in ["", "   "] {
            let middleware = ProxyingMiddleware::new(instances, &ProxyConfig::default(), |i| {
                built.fetch_add(1, Ordering::SeqCst);
                healthy(i)
            })
            .unwrap();
            assert!(!middleware.is_enabled());
        }
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_wrap_is_passthrough() {
        let middleware = ProxyingMiddleware::new("", &ProxyConfig::default(), healthy).unwrap();
        let next: Arc<dyn StringService> = Arc::new(BasicStringService);
        let svc = middleware.wrap(next.clone());

        assert!(Arc::ptr_eq(&svc, &next));
        assert_eq!(svc.uppercase("hi".to_string()).await.unwrap(), "HI");
    }

    #[test]
    fn test_instances_normalized_for_factory() {
        let urls = std::sync::Mutex::new(Vec::new());
        ProxyingMiddleware::new(
            " localhost:8001 , https://svc.example.com/v2/upper,10.0.0.1:80",
            &ProxyConfig::default(),
            |instance| {
                urls.lock().unwrap().push(instance.url().to_string());
                healthy(instance)
            },
        )
        .unwrap();

        assert_eq!(
            *urls.lock().unwrap(),
            vec![
                "http://localhost:8001/uppercase",
                "https://svc.example.com/v2/upper",
                "http://10.0.0.1/uppercase",
            ]
        );
    }

    #[test]
    fn test_blank_entry_rejected() {
        let result = ProxyingMiddleware::new("a:1,,b:2", &ProxyConfig::default(), healthy);
        assert!(matches!(result, Err(ProxyError::InvalidInstance(_))));
    }

    #[test]
    fn test_factory_error_propagates() {
        let result = ProxyingMiddleware::new("a:1", &ProxyConfig::default(), |_| {
            Err(ProxyError::Config("no transport".to_string()))
        });
        assert!(matches!(result, Err(ProxyError::Config(_))));
    }

    #[tokio::test]
    async fn test_uppercase_proxied_count_forwarded() {
        let middleware = ProxyingMiddleware::new("a:1,b:2", &ProxyConfig::default(), healthy).unwrap();
        let svc = middleware.wrap(Arc::new(BasicStringService));

        assert_eq!(svc.uppercase("hi".to_string()).await.unwrap(), "remote:HI");
        assert_eq!(svc.count("hello"), 5);
    }

    #[tokio::test]
    async fn test_remote_error_field_surfaces() {
        let middleware = ProxyingMiddleware::new("a:1", &ProxyConfig::default(), |_| {
            Ok(Arc::new(endpoint_fn(|_req: UppercaseRequest| async {
                Ok::<_, ProxyError>(UppercaseResponse::error("empty string"))
            })) as UppercaseEndpoint)
        })
        .unwrap();
        let svc = middleware.wrap(Arc::new(BasicStringService));

        let err = svc.uppercase(String::new()).await.unwrap_err();
        assert!(matches!(err, ProxyError::Remote(ref msg) if msg == "empty string"));
        assert_eq!(err.to_string(), "empty string");
    }

    #[tokio::test]
    async fn test_remote_error_does_not_trip_breaker() {
        let mut config = ProxyConfig::default();
        config.circuit_breaker.failure_threshold = 1;
        let middleware = ProxyingMiddleware::new("a:1", &config, |_| {
            Ok(Arc::new(endpoint_fn(|_req: UppercaseRequest| async {
                Ok::<_, ProxyError>(UppercaseResponse::error("empty string"))
            })) as UppercaseEndpoint)
        })
        .unwrap();
        let svc = middleware.wrap(Arc::new(BasicStringService));

        for _ in 0..3 {
            assert!(matches!(
                svc.uppercase(String::new()).await,
                Err(ProxyError::Remote(_))
            ));
        }
        assert_eq!(
            middleware.breaker_states(),
            vec![("a:1".to_string(), CircuitState::Closed)]
        );
    }

    #[tokio::test]
    async fn test_failing_instance_opens_breaker_and_fails_over() {
        let mut config = ProxyConfig::default();
        config.circuit_breaker.failure_threshold = 1;
        let middleware = ProxyingMiddleware::new("a:1,b:2", &config, |instance| {
            if instance.address() == "a:1" {
                Ok(Arc::new(endpoint_fn(|_req: UppercaseRequest| async {
                    Err::<UppercaseResponse, _>(ProxyError::Upstream("refused".to_string()))
                })) as UppercaseEndpoint)
            } else {
                healthy(instance)
            }
        })
        .unwrap();
        let svc = middleware.wrap(Arc::new(BasicStringService));

        assert_eq!(svc.uppercase("x".to_string()).await.unwrap(), "remote:X");
        assert_eq!(
            middleware.breaker_states(),
            vec![
                ("a:1".to_string(), CircuitState::Open),
                ("b:2".to_string(), CircuitState::Closed),
            ]
        );

        // Selection lands on the open instance first, then fails over
        assert_eq!(svc.uppercase("y".to_string()).await.unwrap(), "remote:Y");
    }
}
