pub mod api_keys;
pub mod attachments;
