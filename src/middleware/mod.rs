pub mod response;
pub mod validate_user;

pub use response::{ApiResponse, ApiResult};
pub use validate_user::{GuardedIdentity, OwnerIdentity};
