//! Deterministic cache key construction.

use super::ResourceFamily;

/// Build a cache key from a resource family and normalized query parameters.
///
/// Parameter pairs are sorted by key before joining, so two logically
/// identical requests produce the same key regardless of the order the
/// parameters were assembled in.
pub fn cache_key(family: ResourceFamily, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return family.as_str().to_string();
    }

    let mut pairs: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    pairs.sort();

    format!("{}?{}", family.as_str(), pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        let forward = cache_key(
            ResourceFamily::Markets,
            &[
                ("vs_currency", "usd".to_string()),
                ("per_page", "100".to_string()),
                ("page", "1".to_string()),
            ],
        );
        let shuffled = cache_key(
            ResourceFamily::Markets,
            &[
                ("page", "1".to_string()),
                ("vs_currency", "usd".to_string()),
                ("per_page", "100".to_string()),
            ],
        );
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_key_includes_family_prefix() {
        let key = cache_key(ResourceFamily::Global, &[]);
        assert_eq!(key, "global");

        let key = cache_key(ResourceFamily::Chart, &[("days", "7".to_string())]);
        assert_eq!(key, "chart?days=7");
    }

    #[test]
    fn test_different_params_produce_different_keys() {
        let page1 = cache_key(ResourceFamily::Markets, &[("page", "1".to_string())]);
        let page2 = cache_key(ResourceFamily::Markets, &[("page", "2".to_string())]);
        assert_ne!(page1, page2);
    }

    #[test]
    fn test_same_params_different_family_produce_different_keys() {
        let markets = cache_key(ResourceFamily::Markets, &[("id", "bitcoin".to_string())]);
        let detail = cache_key(ResourceFamily::CoinDetail, &[("id", "bitcoin".to_string())]);
        assert_ne!(markets, detail);
    }
}
