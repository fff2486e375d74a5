//! Bearer credential validation against a static set of accepted keys

mod bearer;
mod error;
mod keystore;

pub use bearer::bearer_token;
pub use error::AuthError;
pub use keystore::{API_KEYS_ENV, KeyStore};
