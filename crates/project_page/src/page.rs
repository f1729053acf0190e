use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use models::SalesProject;
use service::{SalesProjectApi, ServiceError};
use tracing::{info, warn};

use crate::dialog::{Dialog, DialogId, FocusManager, ModalDialogService, SubmitButtonLabel};
use crate::errors::PageError;
use crate::overview::{LeadOfferOverview, SalesOverview};

pub const EXPORT_CAPTCHA: &str = "export";

const IRREVERSIBLE: &str = "This action cannot be undone.";

/// Deletes single lead offers; lives in the lead offer service.
#[async_trait]
pub trait LeadOfferApi: Send + Sync {
    async fn delete_lead_offer(&self, offer_id: &str) -> Result<bool, ServiceError>;
}

/// Workflow flags that the backend tracks outside of `SalesProject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectStatus {
    pub approved: bool,
    pub exported: bool,
    pub ordered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingAction {
    DeleteLeadOffer(String),
    DeleteLeadOffers(Vec<String>),
    DeleteSalesProject(String),
    ExportSalesProject { offer_id: String },
    Acknowledge,
}

/// What a submitted dialog did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    LeadOfferDeleted(String),
    LeadOffersDeleted(Vec<String>),
    SalesProjectDeleted(String),
    SalesProjectExported(SalesProject),
    Acknowledged,
}

/// Controller behind the sales project detail page.
pub struct SalesProjectPage {
    sales_projects: Arc<dyn SalesProjectApi>,
    lead_offers: Arc<dyn LeadOfferApi>,
    dialogs: Arc<dyn ModalDialogService>,
    focus: Arc<dyn FocusManager>,
    pending: HashMap<DialogId, (Dialog, PendingAction)>,
    next_dialog_id: DialogId,
    sales_project: Option<SalesProject>,
    sales_overview: Option<SalesOverview>,
    can_delete_lead_offers: bool,
    pub status: ProjectStatus,
    /// Offer selected for export.
    pub offer_id: Option<String>,
}

impl SalesProjectPage {
    pub fn new(
        sales_projects: Arc<dyn SalesProjectApi>,
        lead_offers: Arc<dyn LeadOfferApi>,
        dialogs: Arc<dyn ModalDialogService>,
        focus: Arc<dyn FocusManager>,
    ) -> Self {
        Self {
            sales_projects,
            lead_offers,
            dialogs,
            focus,
            pending: HashMap::new(),
            next_dialog_id: 1,
            sales_project: None,
            sales_overview: None,
            can_delete_lead_offers: false,
            status: ProjectStatus::default(),
            offer_id: None,
        }
    }

    pub fn init(&mut self) {
        self.update_can_delete_lead_offers();
    }

    pub fn sales_project(&self) -> Option<&SalesProject> {
        self.sales_project.as_ref()
    }

    pub fn sales_overview(&self) -> Option<&SalesOverview> {
        self.sales_overview.as_ref()
    }

    /// Whether the "delete all lead offers" button is shown.
    pub fn can_delete_lead_offers(&self) -> bool {
        self.can_delete_lead_offers
    }

    /// Loads the project and rebuilds the overview. Failures open an error alert.
    pub async fn load_sales_project(
        &mut self,
        sales_project_id: &str,
    ) -> Result<&SalesProject, PageError> {
        match self.sales_projects.get_sales_project_by_id(sales_project_id).await {
            Ok(sales_project) => {
                self.status.ordered = sales_project.is_ordered();
                self.sales_overview = Some(SalesOverview::from_project(&sales_project));
                self.update_can_delete_lead_offers();
                Ok(self.sales_project.insert(sales_project))
            }
            Err(err) => {
                self.on_http_error(
                    &err,
                    "Error loading the sales project",
                    "The data could not be loaded. Please try again.",
                );
                Err(err.into())
            }
        }
    }

    /// Whether the page's form is read-only.
    pub fn disabled(&self) -> bool {
        self.status.approved || self.status.exported || self.is_ordered()
    }

    /// Exporting needs a selected offer and a project that is still open.
    pub fn can_be_exported(&self) -> bool {
        self.offer_id.is_some()
            && self.sales_project.is_some()
            && !self.status.exported
            && !self.is_ordered()
            && !self.status.approved
    }

    pub fn can_delete_lead_offer(&self, lead_offer: &LeadOfferOverview) -> bool {
        !lead_offer.ordered && !self.disabled()
    }

    pub fn on_click_delete_lead_offer(
        &mut self,
        trigger: &str,
        lead_offer: Option<&LeadOfferOverview>,
    ) -> Option<DialogId> {
        let lead_offer = lead_offer?;
        let dialog = Dialog::alert(
            self.allocate_dialog_id(),
            self.dialogs.next_level(),
            format!(
                "Do you really want to permanently delete the offer \"{}\"?",
                lead_offer.offer_id
            ),
            IRREVERSIBLE,
        )
        .with_submit_label(SubmitButtonLabel::Delete);
        let action = PendingAction::DeleteLeadOffer(lead_offer.offer_id.clone());
        Some(self.open(trigger, dialog, action))
    }

    /// Asks to delete every offer of the overview that can still be deleted.
    pub fn on_click_delete_lead_offers(
        &mut self,
        trigger: &str,
        sales_overview: &SalesOverview,
    ) -> Option<DialogId> {
        let offer_ids: Vec<String> = sales_overview
            .lead_offer_overviews
            .iter()
            .filter(|o| self.can_delete_lead_offer(o))
            .map(|o| o.offer_id.clone())
            .collect();
        if offer_ids.is_empty() {
            return None;
        }

        let listing: String = offer_ids.iter().map(|id| format!("- {id}\n")).collect();
        let dialog = Dialog::alert(
            self.allocate_dialog_id(),
            self.dialogs.next_level(),
            "Do you really want to permanently delete the following offers?",
            format!("{listing}{IRREVERSIBLE}"),
        )
        .with_submit_label(SubmitButtonLabel::Delete);
        Some(self.open(trigger, dialog, PendingAction::DeleteLeadOffers(offer_ids)))
    }

    pub fn on_click_delete_sales_project(
        &mut self,
        trigger: &str,
        sales_overview: Option<&SalesOverview>,
    ) -> Option<DialogId> {
        let sales_overview = sales_overview?;
        let dialog = Dialog::alert(
            self.allocate_dialog_id(),
            self.dialogs.next_level(),
            format!(
                "Do you really want to permanently delete the project \"{}\"?",
                sales_overview.project_name
            ),
            IRREVERSIBLE,
        )
        .with_submit_label(SubmitButtonLabel::Delete);
        let action = PendingAction::DeleteSalesProject(sales_overview.sales_project_id.clone());
        Some(self.open(trigger, dialog, action))
    }

    /// Opens the export confirmation; the user must type `EXPORT_CAPTCHA` to submit.
    pub fn on_click_export_sales_project(&mut self, trigger: &str) -> Option<DialogId> {
        if !self.can_be_exported() {
            return None;
        }
        let offer_id = self.offer_id.clone()?;
        let project_name = self.sales_project.as_ref()?.project_name.clone();

        let dialog = Dialog::captcha(
            self.allocate_dialog_id(),
            self.dialogs.next_level(),
            format!("Do you really want to export the project \"{project_name}\"?"),
            format!(
                "{IRREVERSIBLE} To confirm, enter the word \"{EXPORT_CAPTCHA}\" \
                 (without quotes, case-sensitive)."
            ),
            EXPORT_CAPTCHA,
        )
        .with_submit_label(SubmitButtonLabel::Export);
        Some(self.open(trigger, dialog, PendingAction::ExportSalesProject { offer_id }))
    }

    /// Confirms an open dialog: closes it, then runs its action.
    /// A captcha dialog stays open while `input` does not match.
    pub async fn submit(
        &mut self,
        dialog_id: DialogId,
        input: Option<&str>,
    ) -> Result<ActionOutcome, PageError> {
        let (dialog, _) = self.pending.get(&dialog_id).ok_or(PageError::UnknownDialog(dialog_id))?;
        if !dialog.accepts(input) {
            return Err(PageError::CaptchaMismatch);
        }
        let action = self.close(dialog_id).ok_or(PageError::UnknownDialog(dialog_id))?;

        let result = self.run(action).await;
        if let Err(PageError::Service(err)) = &result {
            self.on_http_error(
                err,
                "Action failed",
                "The action could not be completed. Please try again.",
            );
        }
        result
    }

    /// Closes an open dialog without running its action.
    pub fn cancel(&mut self, dialog_id: DialogId) -> bool {
        self.close(dialog_id).is_some()
    }

    async fn run(&mut self, action: PendingAction) -> Result<ActionOutcome, PageError> {
        match action {
            PendingAction::Acknowledge => Ok(ActionOutcome::Acknowledged),
            PendingAction::DeleteLeadOffer(offer_id) => {
                self.lead_offers.delete_lead_offer(&offer_id).await?;
                self.forget_offer(&offer_id);
                info!(%offer_id, "lead offer deleted");
                Ok(ActionOutcome::LeadOfferDeleted(offer_id))
            }
            PendingAction::DeleteLeadOffers(offer_ids) => {
                let mut deleted = Vec::with_capacity(offer_ids.len());
                for offer_id in offer_ids {
                    self.lead_offers.delete_lead_offer(&offer_id).await?;
                    self.forget_offer(&offer_id);
                    deleted.push(offer_id);
                }
                info!(count = deleted.len(), "lead offers deleted");
                Ok(ActionOutcome::LeadOffersDeleted(deleted))
            }
            PendingAction::DeleteSalesProject(sales_project_id) => {
                self.sales_projects.delete_sales_project(&sales_project_id).await?;
                self.sales_project = None;
                self.sales_overview = None;
                self.update_can_delete_lead_offers();
                info!(%sales_project_id, "sales project deleted");
                Ok(ActionOutcome::SalesProjectDeleted(sales_project_id))
            }
            PendingAction::ExportSalesProject { offer_id } => {
                let sales_project = self.sales_project.as_ref().ok_or(PageError::NoSalesProject)?;
                let exported = self
                    .sales_projects
                    .generate_routing_sheet_json(sales_project, &offer_id)
                    .await?;
                self.status.exported = true;
                self.sales_project = Some(exported.clone());
                self.update_can_delete_lead_offers();
                info!(%offer_id, "sales project exported");
                Ok(ActionOutcome::SalesProjectExported(exported))
            }
        }
    }

    fn is_ordered(&self) -> bool {
        self.status.ordered || self.sales_project.as_ref().is_some_and(SalesProject::is_ordered)
    }

    fn update_can_delete_lead_offers(&mut self) {
        self.can_delete_lead_offers = self
            .sales_overview
            .as_ref()
            .is_some_and(|overview| {
                overview.lead_offer_overviews.iter().any(|o| self.can_delete_lead_offer(o))
            });
    }

    fn forget_offer(&mut self, offer_id: &str) {
        if let Some(overview) = self.sales_overview.as_mut() {
            overview.remove_offer(offer_id);
        }
        if let Some(sales_project) = self.sales_project.as_mut() {
            sales_project.offer_ids.retain(|id| id != offer_id);
        }
        if self.offer_id.as_deref() == Some(offer_id) {
            self.offer_id = None;
        }
        self.update_can_delete_lead_offers();
    }

    fn on_http_error(&mut self, err: &ServiceError, title: &str, message: &str) {
        warn!(error = %err, status = ?err.status(), "{title}");
        let id = self.allocate_dialog_id();
        let dialog = Dialog::alert(id, self.dialogs.next_level(), title, message);
        self.pending.insert(dialog.id, (dialog.clone(), PendingAction::Acknowledge));
        self.dialogs.push(dialog);
    }

    fn open(&mut self, trigger: &str, dialog: Dialog, action: PendingAction) -> DialogId {
        let id = dialog.id;
        self.focus.add(trigger);
        self.pending.insert(id, (dialog.clone(), action));
        self.dialogs.push(dialog);
        id
    }

    fn close(&mut self, dialog_id: DialogId) -> Option<PendingAction> {
        let (_, action) = self.pending.remove(&dialog_id)?;
        self.dialogs.dismiss(dialog_id);
        if action != PendingAction::Acknowledge {
            self.focus.restore();
        }
        Some(action)
    }

    fn allocate_dialog_id(&mut self) -> DialogId {
        let id = self.next_dialog_id;
        self.next_dialog_id += 1;
        id
    }
}
