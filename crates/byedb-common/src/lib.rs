pub mod errors;
pub mod id;
pub mod types;

pub use errors::{ByedbError, ConfigError};
pub use id::{new_correlation_id, new_id, UserId};
pub use types::{AuthDeniedPolicy, Mode};

pub type Result<T> = std::result::Result<T, ByedbError>;
