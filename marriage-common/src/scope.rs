use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Header/metadata key names carrying tenant context across the REST and bus transports.
/// These constants are the shared vocabulary both the REST extractor and the command
/// consumer use to read the same fields.
pub const TENANT_HEADER: &str = "TENANT_ID";
pub const REGION_HEADER: &str = "REGION";
pub const MAJOR_VERSION_HEADER: &str = "MAJOR_VERSION";
pub const MINOR_VERSION_HEADER: &str = "MINOR_VERSION";

/// An opaque 128-bit tenant identifier that scopes every row and query (GLOSSARY "Tenant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Per-call context carrying the tenant id, a correlation id, and a cancellation signal
/// through every Processor method.
///
/// Rust has no ambient/thread-local context idiom as convenient as some languages offer, so
/// this is passed explicitly rather than carried implicitly.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub tenant_id: TenantId,
    pub trace_id: Uuid,
    pub cancel: CancellationToken,
}

impl RequestScope {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            trace_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(tenant_id: TenantId, cancel: CancellationToken) -> Self {
        Self {
            tenant_id,
            trace_id: Uuid::new_v4(),
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
