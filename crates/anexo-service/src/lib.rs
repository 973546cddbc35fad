pub mod events;
mod http;
mod local;
pub mod request;
pub mod submit;
mod sse;
mod traits;

pub use events::{AttachmentEvent, EventCallback, EventHub, EventKind, Subscription};
pub use http::HttpService;
pub use local::LocalService;
pub use request::{FileContent, SubmissionRequest};
pub use submit::{fetch_submission, fetch_submissions, submit, SubmitError};
pub use traits::{AttachmentRepository, ServiceError};
