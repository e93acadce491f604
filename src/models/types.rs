use crate::cache::Provenance;

/// A payload plus the provenance it was produced with.
///
/// What each client returns. The aggregator combines the provenance with
/// the winning provider's id to build the public `source` label.
#[derive(Clone, Debug)]
pub struct Sourced<T> {
    /// The payload
    pub data: T,
    /// How the payload was produced
    pub provenance: Provenance,
}

/// The aggregator's return shape.
///
/// `source` identifies which upstream and which provenance ultimately
/// satisfied the call, e.g. `"coingecko-live"`, `"coingecko-cache"`,
/// `"coinapi-fallback"`. Observability layers can alert on sustained
/// fallback usage without consumers ever seeing a hard error.
#[derive(Clone, Debug)]
pub struct UnifiedResult<T> {
    /// The payload
    pub data: T,
    /// `"<provider-id>-<provenance>"` label
    pub source: String,
}
