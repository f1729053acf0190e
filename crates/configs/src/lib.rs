use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Backend location and the path templates of every sales project endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gateway_url: String,
    #[serde(default)]
    pub sales_projects: SalesProjectEndpoints,
}

/// Path templates relative to `gateway_url`; `:name` segments are placeholders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SalesProjectEndpoints {
    pub list: String,
    pub find_by_lead_number: String,
    pub find_by_offer_id: String,
    pub find_by_project_name: String,
    pub find_by_salesman_number: String,
    pub search: String,
    pub by_id: String,
    pub post: String,
    pub put: String,
    pub delete: String,
    pub generate_api_pdf_form: String,
    pub generate_frame_contract_pdf: String,
    pub generate_frame_contract_1_pdf: String,
    pub generate_frame_contract_2_pdf: String,
    pub generate_frame_contract_3_pdf: String,
    pub generate_ip_vpn_pdf_form: String,
    pub generate_portal_pdf_form: String,
    pub generate_routing_sheet_pdf: String,
    pub generate_routing_sheet_json: String,
}

impl Default for SalesProjectEndpoints {
    fn default() -> Self {
        let base = "/offer-generator/salesprojects";
        let pdf = "/offer-generator/documents/salesprojects/:salesProjectNumber";
        Self {
            list: base.into(),
            find_by_lead_number: format!("{base}/search/findByLeadNumber?leadNumber=:leadNumber"),
            find_by_offer_id: format!("{base}/search/findByOfferId?offerId=:offerId"),
            find_by_project_name: format!(
                "{base}/search/findByProjectName?projectName=:projectName"
            ),
            find_by_salesman_number: format!(
                "{base}/search/findBySalesmanNumber?salesmanNumber=:salesmanNumber"
            ),
            search: format!("{base}/search"),
            by_id: format!("{base}/:id"),
            post: base.into(),
            put: format!("{base}/:id"),
            delete: format!("{base}/:id"),
            generate_api_pdf_form: format!("{pdf}/api-form"),
            generate_frame_contract_pdf: format!("{pdf}/frame-contract"),
            generate_frame_contract_1_pdf: format!("{pdf}/frame-contract-1"),
            generate_frame_contract_2_pdf: format!("{pdf}/frame-contract-2"),
            generate_frame_contract_3_pdf: format!("{pdf}/frame-contract-3"),
            generate_ip_vpn_pdf_form: format!("{pdf}/ip-vpn-form"),
            generate_portal_pdf_form: format!("{pdf}/portal-form"),
            generate_routing_sheet_pdf: format!("{pdf}/routing-sheet"),
            generate_routing_sheet_json: format!("{pdf}/routing-sheet/:offerId"),
        }
    }
}

/// Response cache settings. Disabled unless turned on explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: false, max_capacity: default_max_capacity(), ttl_secs: default_ttl_secs() }
    }
}

fn default_max_capacity() -> u64 { 1_000 }
fn default_ttl_secs() -> u64 { 300 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Loads `CONFIG_PATH`; a missing file falls back to defaults plus environment.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.api.normalize_from_env();
        self.api.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

impl ApiConfig {
    pub fn normalize_from_env(&mut self) {
        self.apply_gateway_override(std::env::var("API_GATEWAY_URL").ok());
    }

    /// Fills an empty `gateway_url` and strips trailing slashes.
    fn apply_gateway_override(&mut self, from_env: Option<String>) {
        if self.gateway_url.trim().is_empty() {
            if let Some(url) = from_env {
                self.gateway_url = url;
            }
        }
        self.gateway_url = self.gateway_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway_url.is_empty() {
            return Err(anyhow!(
                "api.gateway_url is empty; set it in config.toml or API_GATEWAY_URL"
            ));
        }
        let lower = self.gateway_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.gateway_url must start with http:// or https://"));
        }
        for (name, template) in self.sales_projects.templates() {
            if !template.starts_with('/') {
                return Err(anyhow!("api.sales_projects.{name} must start with '/'"));
            }
        }
        Ok(())
    }
}

impl SalesProjectEndpoints {
    fn templates(&self) -> [(&'static str, &str); 19] {
        [
            ("list", &self.list),
            ("find_by_lead_number", &self.find_by_lead_number),
            ("find_by_offer_id", &self.find_by_offer_id),
            ("find_by_project_name", &self.find_by_project_name),
            ("find_by_salesman_number", &self.find_by_salesman_number),
            ("search", &self.search),
            ("by_id", &self.by_id),
            ("post", &self.post),
            ("put", &self.put),
            ("delete", &self.delete),
            ("generate_api_pdf_form", &self.generate_api_pdf_form),
            ("generate_frame_contract_pdf", &self.generate_frame_contract_pdf),
            ("generate_frame_contract_1_pdf", &self.generate_frame_contract_1_pdf),
            ("generate_frame_contract_2_pdf", &self.generate_frame_contract_2_pdf),
            ("generate_frame_contract_3_pdf", &self.generate_frame_contract_3_pdf),
            ("generate_ip_vpn_pdf_form", &self.generate_ip_vpn_pdf_form),
            ("generate_portal_pdf_form", &self.generate_portal_pdf_form),
            ("generate_routing_sheet_pdf", &self.generate_routing_sheet_pdf),
            ("generate_routing_sheet_json", &self.generate_routing_sheet_json),
        ]
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.max_capacity == 0 {
            return Err(anyhow!("cache.max_capacity must be >= 1 when the cache is enabled"));
        }
        if self.enabled && self.ttl_secs == 0 {
            return Err(anyhow!("cache.ttl_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}
