//! Headless controller for the sales project detail page.
//! - `dialog`: modal dialog descriptions plus the dialog and focus collaborators.
//! - `overview`: the per-offer view of a loaded project.
//! - `page`: click handlers and the actions behind confirmed dialogs.

pub mod dialog;
pub mod errors;
pub mod overview;
pub mod page;

pub use dialog::{
    Dialog, DialogId, DialogKind, DialogStack, FocusManager, FocusStack, ModalDialogService,
    SubmitButtonLabel,
};
pub use errors::PageError;
pub use overview::{LeadOfferOverview, SalesOverview};
pub use page::{ActionOutcome, LeadOfferApi, ProjectStatus, SalesProjectPage, EXPORT_CAPTCHA};
