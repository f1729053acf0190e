//! Service layer talking to the offer generator backend.
//! - `transport` abstracts the HTTP client, `cache` the optional response cache.
//! - `rest_api_service` orchestrates one request: call, parse, cache, deliver once.
//! - `sales_project_service` defines the concrete sales project endpoints.

pub mod cache;
pub mod errors;
pub mod pagination;
pub mod rest_api_service;
pub mod sales_project_service;
pub mod transport;

pub use cache::{CacheKey, CacheKind, MokaResponseCache, ResponseCache};
pub use errors::{ServiceError, TransportError};
pub use pagination::CollectionRequestParams;
pub use rest_api_service::{RequestOptions, ResponseChannel, RestApiService};
pub use sales_project_service::{SalesProjectApi, SalesProjectService};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest};
