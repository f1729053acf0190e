//! Generic request orchestration shared by all resource services.
//!
//! Each `request` is a one-shot state machine: pending until the transport (or
//! the cache) answers, then exactly one `Ok` or `Err` is delivered on the
//! returned `ResponseChannel`. There is no retry and no timeout; cancelling or
//! dropping the channel aborts the request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use common::rest_api_helper::{cancel_subscription, Subscription};
use models::ModelError;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::cache::{get_typed, CacheKey, CacheKind, ResponseCache};
use crate::errors::{ServiceError, TransportError};
use crate::transport::{HttpTransport, Method, TransportRequest};

/// Cache behaviour of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Skip the cache lookup and always go to the backend.
    pub ignore_cache: bool,
    /// Store the parsed result after a live success.
    pub use_cache: bool,
}

impl RequestOptions {
    /// Read from and write to the cache.
    pub const fn cached() -> Self {
        Self { ignore_cache: false, use_cache: true }
    }

    /// Bypass the cache entirely.
    pub const fn live() -> Self {
        Self { ignore_cache: true, use_cache: false }
    }

    /// Always hit the backend, remember the result.
    pub const fn refresh() -> Self {
        Self { ignore_cache: true, use_cache: true }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::cached()
    }
}

/// Single-value result of a request. Await it to get the outcome.
#[derive(Debug)]
pub struct ResponseChannel<T> {
    rx: oneshot::Receiver<Result<T, ServiceError>>,
    subscription: Subscription,
}

impl<T> ResponseChannel<T> {
    /// Channel that is already resolved; nothing is in flight.
    pub fn ready(result: Result<T, ServiceError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        let subscription = Subscription::new();
        subscription.unsubscribe();
        Self { rx, subscription }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Aborts the in-flight request; awaiting afterwards yields `Cancelled`
    /// unless the result was already delivered.
    pub fn cancel(&self) {
        cancel_subscription(Some(&self.subscription));
    }
}

impl<T> Future for ResponseChannel<T> {
    type Output = Result<T, ServiceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ServiceError::Cancelled)))
    }
}

/// Dropping an unresolved channel aborts its request; nothing is cached then.
impl<T> Drop for ResponseChannel<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Shared plumbing for resource services: transport plus optional cache.
#[derive(Clone)]
pub struct RestApiService {
    transport: Arc<dyn HttpTransport>,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl RestApiService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResponseCache>> {
        self.cache.as_ref()
    }

    /// Issues `call` and parses the response with `parse`.
    ///
    /// The call starts immediately on the current tokio runtime. With a cache
    /// present, a hit for `(kind, request_url)` answers without touching the
    /// transport unless `options.ignore_cache`; a live success is stored when
    /// `options.use_cache`. A successful DELETE evicts `(kind, request_url)`.
    /// `request_url` defaults to the call's url.
    pub fn request<T, F>(
        &self,
        call: TransportRequest,
        parse: F,
        kind: CacheKind,
        options: RequestOptions,
        request_url: Option<&str>,
    ) -> ResponseChannel<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Value) -> Result<T, ModelError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let subscription = Subscription::new();
        let key = CacheKey::new(kind, request_url.unwrap_or(&call.url));
        let transport = Arc::clone(&self.transport);
        let cache = self.cache.clone();
        let task_subscription = subscription.clone();

        let handle = tokio::spawn(async move {
            let outcome = execute(transport, cache, call, parse, key, options).await;
            cancel_subscription(Some(&task_subscription));
            let _ = tx.send(outcome);
        });
        subscription.attach(handle.abort_handle());

        ResponseChannel { rx, subscription }
    }
}

async fn execute<T, F>(
    transport: Arc<dyn HttpTransport>,
    cache: Option<Arc<dyn ResponseCache>>,
    call: TransportRequest,
    parse: F,
    key: CacheKey,
    options: RequestOptions,
) -> Result<T, ServiceError>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(&Value) -> Result<T, ModelError>,
{
    if let Some(cache) = cache.as_deref().filter(|_| !options.ignore_cache) {
        if let Some(hit) = get_typed::<T>(cache, &key).await {
            debug!(kind = ?key.kind, url = %key.url, "served from cache");
            return Ok(hit);
        }
    }

    debug!(method = %call.method, url = %call.url, "sending request");
    let evicts = call.method == Method::DELETE;
    let response = match transport.send(call).await {
        Ok(response) => response,
        Err(err) => {
            log_transport_error(&err, &key.url);
            return Err(err.into());
        }
    };

    let instance = parse(&response).map_err(|e| {
        warn!(
            kind = ?key.kind,
            url = %key.url,
            error = %e,
            payload = %response,
            "error parsing response"
        );
        ServiceError::Parse(e)
    })?;

    if let Some(cache) = cache.as_deref().filter(|_| evicts) {
        cache.invalidate(&key).await;
        debug!(kind = ?key.kind, url = %key.url, "cache entry evicted");
    }

    if let Some(cache) = cache.filter(|_| options.use_cache) {
        // a refresh replaces whatever the key held
        if options.ignore_cache {
            cache.invalidate(&key).await;
        }
        let stored = cache.register(key.clone(), Arc::new(instance.clone())).await;
        debug!(kind = ?key.kind, url = %key.url, stored, "cache populated");
    }
    Ok(instance)
}

fn log_transport_error(err: &TransportError, url: &str) {
    match err {
        TransportError::Client(message) => {
            error!(%url, %message, "an error occurred before the backend answered");
        }
        TransportError::Status { status, body } => {
            error!(%url, status, %body, "backend returned an error status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaResponseCache;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers every call with the same canned result and counts calls.
    struct FakeTransport {
        reply: Result<Value, TransportError>,
        calls: AtomicUsize,
    }

    impl FakeTransport {
        fn ok(value: Value) -> Arc<Self> {
            Arc::new(Self { reply: Ok(value), calls: AtomicUsize::new(0) })
        }

        fn failing(err: TransportError) -> Arc<Self> {
            Arc::new(Self { reply: Err(err), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn send(&self, _request: TransportRequest) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    struct PendingTransport;

    /// Answers after a delay and counts the calls that ran to the end.
    struct SlowTransport {
        completed: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for SlowTransport {
        async fn send(&self, _request: TransportRequest) -> Result<Value, TransportError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"name": "late"}))
        }
    }

    #[async_trait]
    impl HttpTransport for PendingTransport {
        async fn send(&self, _request: TransportRequest) -> Result<Value, TransportError> {
            std::future::pending().await
        }
    }

    fn name_of(json: &Value) -> Result<String, ModelError> {
        json.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ModelError::invalid("Named", "missing name"))
    }

    fn cached_service(transport: Arc<FakeTransport>) -> RestApiService {
        let cache = MokaResponseCache::new(10, Duration::from_secs(60));
        RestApiService::new(transport).with_cache(Arc::new(cache))
    }

    const URL: &str = "http://backend/items/1";

    fn get_name(service: &RestApiService, options: RequestOptions) -> ResponseChannel<String> {
        get_name_keyed(service, CacheKind::SalesProject, options, None)
    }

    fn get_name_keyed(
        service: &RestApiService,
        kind: CacheKind,
        options: RequestOptions,
        request_url: Option<&str>,
    ) -> ResponseChannel<String> {
        service.request(TransportRequest::get(URL), name_of, kind, options, request_url)
    }

    #[tokio::test]
    async fn success_is_parsed_and_delivered_once() {
        let transport = FakeTransport::ok(json!({"name": "first"}));
        let service = RestApiService::new(transport.clone());

        let channel = get_name(&service, RequestOptions::cached());
        let subscription = channel.subscription().clone();
        assert_eq!(channel.await, Ok("first".to_string()));
        assert_eq!(transport.calls(), 1);
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn transport_failure_keeps_status_and_body() {
        let missing = TransportError::status(404, r#"{"message":"missing"}"#);
        let transport = FakeTransport::failing(missing);
        let service = RestApiService::new(transport);

        let err = get_name(&service, RequestOptions::cached()).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        let body = json!({"message": "missing"});
        assert_eq!(err, ServiceError::Transport(TransportError::Status { status: 404, body }));
    }

    #[tokio::test]
    async fn parse_failure_is_reported() {
        let service = RestApiService::new(FakeTransport::ok(json!({"nom": "x"})));
        let err = get_name(&service, RequestOptions::live()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_transport() {
        let transport = FakeTransport::ok(json!({"name": "cached"}));
        let service = cached_service(transport.clone());

        let first = get_name(&service, RequestOptions::cached()).await;
        let second = get_name(&service, RequestOptions::cached()).await;
        assert_eq!(first, Ok("cached".to_string()));
        assert_eq!(second, Ok("cached".to_string()));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn ignore_cache_always_goes_live() {
        let transport = FakeTransport::ok(json!({"name": "x"}));
        let service = cached_service(transport.clone());

        for _ in 0..2 {
            get_name(&service, RequestOptions::refresh()).await.unwrap();
        }
        assert_eq!(transport.calls(), 2);

        // refresh populated the cache, so a cached read is served without a call
        get_name(&service, RequestOptions::cached()).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_replaces_stale_entry() {
        let transport = FakeTransport::ok(json!({"name": "fresh"}));
        let service = cached_service(transport.clone());
        let key = CacheKey::new(CacheKind::SalesProject, URL);
        let cache = service.cache().unwrap();
        cache.register(key.clone(), Arc::new("stale".to_string())).await;

        get_name(&service, RequestOptions::refresh()).await.unwrap();
        assert_eq!(get_typed::<String>(cache.as_ref(), &key).await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn live_requests_do_not_populate() {
        let transport = FakeTransport::ok(json!({"name": "x"}));
        let service = cached_service(transport.clone());

        get_name(&service, RequestOptions::live()).await.unwrap();
        get_name(&service, RequestOptions::cached()).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn cache_key_uses_kind_and_request_url() {
        let transport = FakeTransport::ok(json!({"name": "x"}));
        let service = cached_service(transport.clone());
        let cached = RequestOptions::cached();
        let (project, wrapper) = (CacheKind::SalesProject, CacheKind::SalesProjectWrapper);

        get_name_keyed(&service, project, cached, Some("key-a")).await.unwrap();
        get_name_keyed(&service, wrapper, cached, Some("key-a")).await.unwrap();
        get_name_keyed(&service, project, cached, Some("key-b")).await.unwrap();
        get_name_keyed(&service, project, cached, Some("key-a")).await.unwrap();
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn delete_evicts_its_key() {
        let transport = FakeTransport::ok(json!({"name": "x"}));
        let service = cached_service(transport.clone());
        let key = CacheKey::new(CacheKind::SalesProject, URL);
        let cache = service.cache().unwrap();
        cache.register(key.clone(), Arc::new("x".to_string())).await;

        let delete = TransportRequest::delete(URL);
        let deleted = service
            .request(delete, |_| Ok(true), CacheKind::SalesProject, RequestOptions::live(), None)
            .await;
        assert_eq!(deleted, Ok(true));
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn cancelled_request_resolves_to_cancelled() {
        let service = RestApiService::new(Arc::new(PendingTransport));
        let channel = get_name(&service, RequestOptions::live());

        channel.cancel();
        channel.cancel();
        assert!(!channel.subscription().is_active());
        assert_eq!(channel.await, Err(ServiceError::Cancelled));
    }

    #[tokio::test]
    async fn dropped_channel_aborts_request() {
        let transport = Arc::new(SlowTransport { completed: AtomicUsize::new(0) });
        let cache = Arc::new(MokaResponseCache::new(10, Duration::from_secs(60)));
        let service = RestApiService::new(transport.clone()).with_cache(cache.clone());

        let channel = get_name(&service, RequestOptions::cached());
        let subscription = channel.subscription().clone();
        drop(channel);
        assert!(!subscription.is_active());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.completed.load(Ordering::SeqCst), 0);
        assert!(cache.get(&CacheKey::new(CacheKind::SalesProject, URL)).await.is_none());
    }

    #[tokio::test]
    async fn ready_channel_resolves_immediately() {
        let channel = ResponseChannel::ready(Ok(5));
        assert!(!channel.subscription().is_active());
        assert_eq!(channel.await, Ok(5));
    }
}
