/// Classification for retry pacing.
///
/// Used to determine how the fetch loop should wait before the next
/// attempt against an upstream.
///
/// # Behavior Summary
///
/// | Class | Wait Between Attempts |
/// |-------|----------------------|
/// | `RateLimitWait` | `Retry-After` hint (or configured default), capped |
/// | `Backoff` | `backoff_base * 2^attempt` |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The upstream asked us to slow down (HTTP 429).
    ///
    /// Honor its `Retry-After` header when present, falling back to the
    /// configured default wait. The wait is capped at
    /// `max_rate_limit_wait` so a hostile header cannot stall a request
    /// indefinitely.
    RateLimitWait,

    /// Transient failure (timeout, 5xx, network error).
    ///
    /// Wait `backoff_base * 2^attempt` before the next attempt.
    Backoff,
}
