use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use configs::{ApiConfig, AppConfig, CacheConfig};
use serde_json::{json, Value};
use service::{
    CollectionRequestParams, RequestOptions, SalesProjectApi, SalesProjectService, ServiceError,
};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Backend {
    list_hits: Arc<AtomicUsize>,
}

fn project_json(id: &str) -> Value {
    json!({
        "id": id,
        "createdDate": "2023-01-05T10:00:00+0000",
        "dateOrdered": null,
        "lastModifiedDate": "2023-01-06T09:15:00+0000",
        "leadNumber": 4711,
        "offerIds": ["o-1"],
        "orderedBy": null,
        "orderedOfferId": null,
        "projectName": "Fiber rollout",
        "salesmanNumber": 42,
        "salesProjectNumber": 1001
    })
}

async fn list(State(backend): State<Backend>) -> Json<Value> {
    backend.list_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "_embedded": {"salesProjects": [project_json("abc123"), 17, project_json("def456")]},
        "page": {"size": 20, "totalElements": 3, "totalPages": 1, "number": 0}
    }))
}

async fn search() -> Json<Value> {
    Json(json!({
        "_embedded": {"salesProjects": []},
        "page": {"size": 0, "totalElements": 0, "totalPages": 0, "number": 0}
    }))
}

async fn by_id(Path(id): Path<String>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if id == "abc123" {
        Ok(Json(project_json(&id)))
    } else {
        let body = json!({"message": format!("sales project {id} not found")});
        Err((StatusCode::NOT_FOUND, Json(body)))
    }
}

async fn delete(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

struct TestBackend {
    base_url: String,
    state: Backend,
}

async fn start_backend() -> anyhow::Result<TestBackend> {
    let state = Backend::default();
    let app = Router::new()
        .route("/offer-generator/salesprojects", get(list))
        .route("/offer-generator/salesprojects/search", get(search))
        .route("/offer-generator/salesprojects/:id", get(by_id).delete(delete))
        .with_state(state.clone());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("backend error: {}", e); }
    });

    Ok(TestBackend { base_url, state })
}

fn client(base_url: &str, cache_enabled: bool) -> anyhow::Result<SalesProjectService> {
    let config = AppConfig {
        api: ApiConfig { gateway_url: base_url.to_string(), ..Default::default() },
        cache: CacheConfig { enabled: cache_enabled, ..Default::default() },
    };
    Ok(SalesProjectService::from_config(&config)?)
}

#[tokio::test]
async fn get_by_id_emits_parsed_project() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, false)?;

    let project = service.get_sales_project_by_id("abc123", RequestOptions::cached()).await?;
    assert_eq!(project.id(), Some("abc123"));
    assert_eq!(project.created_date(), Some(&Utc.with_ymd_and_hms(2023, 1, 5, 10, 0, 0).unwrap()));
    assert_eq!(project.lead_number, Some(4711));
    assert!(!project.is_ordered());
    Ok(())
}

#[tokio::test]
async fn not_found_keeps_status_and_body() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, false)?;

    let err = SalesProjectApi::get_sales_project_by_id(&service, "nope").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ServiceError::Transport(service::TransportError::Status { body, .. }) => {
            assert_eq!(body["message"], "sales project nope not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn list_drops_malformed_records() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, false)?;

    let params = CollectionRequestParams::default();
    let wrapper = service.get_sales_projects(&params, RequestOptions::cached()).await?;
    let ids: Vec<_> = wrapper.iter().filter_map(|p| p.id()).collect();
    assert_eq!(ids, ["abc123", "def456"]);
    assert_eq!(wrapper.dropped(), 1);
    assert_eq!(wrapper.page().map(|p| p.total_elements()), Some(3));
    Ok(())
}

#[tokio::test]
async fn empty_search_has_page_but_no_first_item() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, false)?;

    let params = CollectionRequestParams::default();
    let wrapper = service.search("nothing", &params, RequestOptions::live()).await?;
    assert!(wrapper.is_empty());
    assert!(wrapper.page().is_some());
    assert!(wrapper.first_item().is_none());
    Ok(())
}

#[tokio::test]
async fn delete_with_no_content_resolves_true() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, false)?;

    assert!(SalesProjectApi::delete_sales_project(&service, "abc123").await?);
    Ok(())
}

#[tokio::test]
async fn cache_short_circuits_repeated_list_reads() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, true)?;
    let params = CollectionRequestParams::default();

    service.get_sales_projects(&params, RequestOptions::cached()).await?;
    service.get_sales_projects(&params, RequestOptions::cached()).await?;
    assert_eq!(backend.state.list_hits.load(Ordering::SeqCst), 1);

    service.get_sales_projects(&params, RequestOptions::refresh()).await?;
    assert_eq!(backend.state.list_hits.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn without_cache_every_read_is_live() -> anyhow::Result<()> {
    let backend = start_backend().await?;
    let service = client(&backend.base_url, false)?;
    let params = CollectionRequestParams::default();

    service.get_sales_projects(&params, RequestOptions::cached()).await?;
    service.get_sales_projects(&params, RequestOptions::cached()).await?;
    assert_eq!(backend.state.list_hits.load(Ordering::SeqCst), 2);
    Ok(())
}
