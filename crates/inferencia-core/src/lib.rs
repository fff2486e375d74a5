//! Types shared by every layer of the gateway: the error envelope and the
//! request-scoped values threaded through the middleware pipeline

pub mod context;
pub mod error;

pub use context::{AuthenticatedKey, REQUEST_ID_HEADER, RequestContext, RequestId};
pub use error::{ApiError, ErrorKind, HttpError};
