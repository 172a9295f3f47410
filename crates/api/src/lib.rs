pub mod api;
pub mod envelope;
pub mod error;
pub mod types;

pub use api::{ClientOptions, ResourceClient};
pub use envelope::{normalize, Envelope, EnvelopeError};
pub use error::{ApiError, ApiResult};
pub use types::*;
