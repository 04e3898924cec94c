use marriage_domain::{Ceremony, Marriage};

/// Read-side shape returned by `MarriageProcessor::current_marriage`. JSON:API-level
/// marshalling for the REST layer lives in marriage-api; this just bundles what the query
/// already needed to join.
#[derive(Debug, Clone)]
pub struct MarriageView {
    pub marriage: Marriage,
    pub ceremony: Option<Ceremony>,
}
