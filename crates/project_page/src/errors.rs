use service::ServiceError;
use thiserror::Error;

use crate::dialog::DialogId;

#[derive(Debug, Error, PartialEq)]
pub enum PageError {
    #[error("no open dialog with id {0}")]
    UnknownDialog(DialogId),
    #[error("confirmation input does not match")]
    CaptchaMismatch,
    #[error("no sales project loaded")]
    NoSalesProject,
    #[error(transparent)]
    Service(#[from] ServiceError),
}
