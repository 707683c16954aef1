#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! OAuth2 client-credentials token management (component C6, spec §4.6).

mod config;
mod error_map;
mod manager;
mod token;

pub use config::OAuthConfig;
pub use error_map::{categorize_oauth_error, TokenErrorResponse};
pub use manager::TokenManager;
pub use token::OAuthTokenRecord;
