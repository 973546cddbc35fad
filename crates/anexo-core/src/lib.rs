pub mod api_key;
pub mod attachment;
pub mod document;
pub mod error;
pub mod filter;
pub mod gde;
pub mod payload;
pub mod rules;
pub mod submission;
pub mod validate;

pub use attachment::Attachment;
pub use document::DocumentType;
pub use error::{FieldError, FieldErrorKind, FieldErrors, PayloadError, ValidationError};
pub use filter::SubmissionFilter;
pub use gde::GdeType;
pub use payload::{DocumentFields, NormalizedPayload};
pub use submission::Submission;
pub use validate::{validate, validate_at, FileUpload, FormInput};
