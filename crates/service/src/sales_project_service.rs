//! Sales project endpoints of the offer generator backend.

use std::sync::Arc;

use async_trait::async_trait;
use configs::{ApiConfig, AppConfig, SalesProjectEndpoints};
use models::{
    ModelError, RestApiModel, SalesProject, SalesProjectPdfDocumentType, SalesProjectWrapper,
};
use serde_json::Value;
use tracing::instrument;

use crate::cache::{CacheKind, MokaResponseCache};
use crate::errors::ServiceError;
use crate::pagination::{append_query, CollectionRequestParams};
use crate::rest_api_service::{RequestOptions, ResponseChannel, RestApiService};
use crate::transport::{ReqwestTransport, TransportRequest};

const CACHE_KIND_INSTANCE: CacheKind = CacheKind::SalesProject;
const CACHE_KIND_WRAPPER: CacheKind = CacheKind::SalesProjectWrapper;

/// What the project page needs from the backend.
#[async_trait]
pub trait SalesProjectApi: Send + Sync {
    async fn get_sales_project_by_id(&self, project_id: &str) -> Result<SalesProject, ServiceError>;

    async fn delete_sales_project(&self, project_id: &str) -> Result<bool, ServiceError>;

    async fn generate_routing_sheet_json(
        &self,
        sales_project: &SalesProject,
        offer_id: &str,
    ) -> Result<SalesProject, ServiceError>;
}

/// Fills display defaults into a freshly loaded project.
pub fn set_defaults(sales_project: &mut SalesProject) {
    if sales_project.project_name.trim().is_empty() {
        if let Some(number) = sales_project.sales_project_number() {
            sales_project.project_name = format!("Project {number}");
        }
    }
}

fn parse_project(json: &Value) -> Result<SalesProject, ModelError> {
    let mut project = SalesProject::from_json(json)?;
    set_defaults(&mut project);
    Ok(project)
}

fn parse_wrapper(json: &Value) -> Result<SalesProjectWrapper, ModelError> {
    SalesProjectWrapper::from_json_with(json, parse_project)
}

#[derive(Clone)]
pub struct SalesProjectService {
    api: RestApiService,
    gateway_url: String,
    endpoints: SalesProjectEndpoints,
}

impl SalesProjectService {
    pub fn new(api: RestApiService, config: &ApiConfig) -> Self {
        Self {
            api,
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            endpoints: config.sales_projects.clone(),
        }
    }

    /// Reqwest transport, plus the moka cache when enabled in `config.cache`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let mut api = RestApiService::new(Arc::new(ReqwestTransport::new()?));
        if let Some(cache) = MokaResponseCache::from_config(&config.cache) {
            api = api.with_cache(Arc::new(cache));
        }
        Ok(Self::new(api, &config.api))
    }

    /// Gateway url + template with `:name` placeholders replaced by encoded values.
    fn url(&self, template: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.gateway_url, template);
        for (name, value) in params {
            url = url.replace(&format!(":{name}"), &urlencoding::encode(value));
        }
        url
    }

    fn request_wrapper(
        &self,
        url: String,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let call = TransportRequest::get(&url);
        self.api.request(call, parse_wrapper, CACHE_KIND_WRAPPER, options, Some(&url))
    }

    fn request_project(
        &self,
        call: TransportRequest,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProject> {
        let url = call.url.clone();
        self.api.request(call, parse_project, CACHE_KIND_INSTANCE, options, Some(&url))
    }

    // --------------- collections ---------------

    pub fn get_sales_projects(
        &self,
        params: &CollectionRequestParams,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let url = params.apply(&self.url(&self.endpoints.list, &[]));
        self.request_wrapper(url, options)
    }

    pub fn get_sales_projects_by_lead_number(
        &self,
        lead_number: i64,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let number = lead_number.to_string();
        let url = self.url(&self.endpoints.find_by_lead_number, &[("leadNumber", &number)]);
        self.request_wrapper(url, options)
    }

    pub fn get_sales_projects_by_offer_id(
        &self,
        offer_id: &str,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let url = self.url(&self.endpoints.find_by_offer_id, &[("offerId", offer_id)]);
        self.request_wrapper(url, options)
    }

    pub fn get_sales_projects_by_project_name(
        &self,
        project_name: &str,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let url = self.url(&self.endpoints.find_by_project_name, &[("projectName", project_name)]);
        self.request_wrapper(url, options)
    }

    pub fn get_sales_projects_by_salesman_number(
        &self,
        salesman_number: i64,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let number = salesman_number.to_string();
        let url = self.url(&self.endpoints.find_by_salesman_number, &[("salesmanNumber", &number)]);
        self.request_wrapper(url, options)
    }

    /// Full-text search; callers normally pass `RequestOptions::live()`.
    pub fn search(
        &self,
        term: &str,
        params: &CollectionRequestParams,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProjectWrapper> {
        let url = params.apply(&self.url(&self.endpoints.search, &[]));
        let url = append_query(&url, &format!("term={}", urlencoding::encode(term)));
        self.request_wrapper(url, options)
    }

    // --------------- single instance ---------------

    pub fn get_sales_project_by_id(
        &self,
        project_id: &str,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProject> {
        let url = self.url(&self.endpoints.by_id, &[("id", project_id)]);
        self.request_project(TransportRequest::get(url), options)
    }

    /// Resolves to `true` once the backend confirmed the deletion; the cached
    /// by-id read of the project is evicted.
    pub fn delete_sales_project(&self, project_id: &str) -> ResponseChannel<bool> {
        let url = self.url(&self.endpoints.delete, &[("id", project_id)]);
        let by_id_url = self.url(&self.endpoints.by_id, &[("id", project_id)]);
        self.api.request(
            TransportRequest::delete(url),
            |_| Ok(true),
            CACHE_KIND_INSTANCE,
            RequestOptions::live(),
            Some(&by_id_url),
        )
    }

    pub fn post_sales_project(
        &self,
        sales_project: &SalesProject,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProject> {
        let url = self.url(&self.endpoints.post, &[]);
        self.request_project(TransportRequest::post(url, sales_project.to_json()), options)
    }

    pub fn put_sales_project(
        &self,
        sales_project: &SalesProject,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProject> {
        let Some(id) = sales_project.id() else {
            let missing_id = ServiceError::invalid_request("cannot put a sales project without id");
            return ResponseChannel::ready(Err(missing_id));
        };
        let url = self.url(&self.endpoints.put, &[("id", id)]);
        self.request_project(TransportRequest::put(url, sales_project.to_json()), options)
    }

    // --------------- documents ---------------

    fn pdf_template(&self, document_type: SalesProjectPdfDocumentType) -> &str {
        use SalesProjectPdfDocumentType::*;
        match document_type {
            ApiPdfForm => &self.endpoints.generate_api_pdf_form,
            FrameContract => &self.endpoints.generate_frame_contract_pdf,
            FrameContract1 => &self.endpoints.generate_frame_contract_1_pdf,
            FrameContract2 => &self.endpoints.generate_frame_contract_2_pdf,
            FrameContract3 => &self.endpoints.generate_frame_contract_3_pdf,
            IpVpnPdfForm => &self.endpoints.generate_ip_vpn_pdf_form,
            PortalPdfForm => &self.endpoints.generate_portal_pdf_form,
            RoutingSheet => &self.endpoints.generate_routing_sheet_pdf,
        }
    }

    /// Asks the backend to render a PDF; resolves to the updated project.
    pub fn generate_pdf(
        &self,
        sales_project: &SalesProject,
        document_type: SalesProjectPdfDocumentType,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProject> {
        let Some(number) = sales_project.sales_project_number() else {
            return ResponseChannel::ready(Err(ServiceError::invalid_request(format!(
                "cannot generate {document_type} without a sales project number"
            ))));
        };
        let number = number.to_string();
        let url = self.url(self.pdf_template(document_type), &[("salesProjectNumber", &number)]);
        self.request_project(TransportRequest::get(url), options)
    }

    /// Routing sheet of `offer_id` as JSON, i.e. the project export.
    pub fn generate_routing_sheet_json(
        &self,
        sales_project: &SalesProject,
        offer_id: &str,
        options: RequestOptions,
    ) -> ResponseChannel<SalesProject> {
        let Some(number) = sales_project.sales_project_number() else {
            return ResponseChannel::ready(Err(ServiceError::invalid_request(
                "cannot export a sales project without a sales project number",
            )));
        };
        let number = number.to_string();
        let url = self.url(
            &self.endpoints.generate_routing_sheet_json,
            &[("salesProjectNumber", &number), ("offerId", offer_id)],
        );
        self.request_project(TransportRequest::get(url), options)
    }
}

#[async_trait]
impl SalesProjectApi for SalesProjectService {
    #[instrument(skip(self))]
    async fn get_sales_project_by_id(
        &self,
        project_id: &str,
    ) -> Result<SalesProject, ServiceError> {
        let options = RequestOptions::cached();
        SalesProjectService::get_sales_project_by_id(self, project_id, options).await
    }

    #[instrument(skip(self))]
    async fn delete_sales_project(&self, project_id: &str) -> Result<bool, ServiceError> {
        SalesProjectService::delete_sales_project(self, project_id).await
    }

    #[instrument(skip(self, sales_project), fields(project_id = ?sales_project.id()))]
    async fn generate_routing_sheet_json(
        &self,
        sales_project: &SalesProject,
        offer_id: &str,
    ) -> Result<SalesProject, ServiceError> {
        let options = RequestOptions::refresh();
        SalesProjectService::generate_routing_sheet_json(self, sales_project, offer_id, options)
            .await
    }
}
