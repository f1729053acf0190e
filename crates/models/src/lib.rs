//! Plain data models mirroring the backend REST resources.
//!
//! - `RestApiModel` is the JSON contract every resource implements.
//! - `RestApiWrapper<T>` is the paginated collection envelope, parsed best-effort.

pub mod document_type;
pub mod errors;
pub mod model;
pub mod page;
pub mod sales_project;
pub mod wrapper;

pub use document_type::SalesProjectPdfDocumentType;
pub use errors::ModelError;
pub use model::{EmbeddedResource, RestApiModel};
pub use page::Page;
pub use sales_project::{SalesProject, SalesProjectWrapper};
pub use wrapper::{ItemOutcome, RestApiWrapper};
