//! Google API access: credentials, typed client, and error mapping.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::Credentials;
pub use client::IamClient;
pub use error::{ApiError, ApiResult};
