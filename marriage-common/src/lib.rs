pub mod clock;
pub mod config;
pub mod error;
pub mod scope;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EnvConfig;
pub use error::AppError;
pub use scope::{
    RequestScope, TenantId, MAJOR_VERSION_HEADER, MINOR_VERSION_HEADER, REGION_HEADER, TENANT_HEADER,
};
