//! Synthetic seed payloads, one table per resource family.
//!
//! When an upstream is down and the cache holds nothing for a key, the
//! clients serve these representative values instead of failing the
//! caller. Keeping the table in one place makes the never-hard-fail
//! policy auditable and swappable per deployment.
//!
//! Seed prices are static snapshots, not live data; every payload built
//! here is labeled `fallback` and stays labeled that way while it sits in
//! the cache.

use std::collections::BTreeMap;

use chrono::{Duration as ChronoDuration, Utc};
use lazy_static::lazy_static;
use rust_decimal::Decimal;

use crate::models::{
    ChartParams, ChartPoint, CoinDetail, CoinMarket, ExchangeRates, GlobalSnapshot, MarketChart,
    MarketSummary, MarketsParams, RateInfo,
};

struct SeedCoin {
    id: &'static str,
    symbol: &'static str,
    name: &'static str,
    price: Decimal,
    market_cap: Decimal,
    volume: Decimal,
    circulating_supply: Decimal,
}

lazy_static! {
    /// Top coins by market cap, with representative figures.
    static ref SEED_COINS: Vec<SeedCoin> = vec![
        SeedCoin {
            id: "bitcoin",
            symbol: "btc",
            name: "Bitcoin",
            price: Decimal::new(64_250, 0),
            market_cap: Decimal::new(1_265_000_000_000, 0),
            volume: Decimal::new(28_400_000_000, 0),
            circulating_supply: Decimal::new(19_700_000, 0),
        },
        SeedCoin {
            id: "ethereum",
            symbol: "eth",
            name: "Ethereum",
            price: Decimal::new(3_150, 0),
            market_cap: Decimal::new(378_000_000_000, 0),
            volume: Decimal::new(14_200_000_000, 0),
            circulating_supply: Decimal::new(120_200_000, 0),
        },
        SeedCoin {
            id: "tether",
            symbol: "usdt",
            name: "Tether",
            price: Decimal::new(100, 2),
            market_cap: Decimal::new(112_000_000_000, 0),
            volume: Decimal::new(52_000_000_000, 0),
            circulating_supply: Decimal::new(112_000_000_000, 0),
        },
        SeedCoin {
            id: "binancecoin",
            symbol: "bnb",
            name: "BNB",
            price: Decimal::new(585, 0),
            market_cap: Decimal::new(87_000_000_000, 0),
            volume: Decimal::new(1_900_000_000, 0),
            circulating_supply: Decimal::new(147_000_000, 0),
        },
        SeedCoin {
            id: "solana",
            symbol: "sol",
            name: "Solana",
            price: Decimal::new(145, 0),
            market_cap: Decimal::new(67_000_000_000, 0),
            volume: Decimal::new(2_800_000_000, 0),
            circulating_supply: Decimal::new(463_000_000, 0),
        },
        SeedCoin {
            id: "ripple",
            symbol: "xrp",
            name: "XRP",
            price: Decimal::new(52, 2),
            market_cap: Decimal::new(29_000_000_000, 0),
            volume: Decimal::new(1_100_000_000, 0),
            circulating_supply: Decimal::new(55_600_000_000, 0),
        },
        SeedCoin {
            id: "usd-coin",
            symbol: "usdc",
            name: "USDC",
            price: Decimal::new(100, 2),
            market_cap: Decimal::new(33_000_000_000, 0),
            volume: Decimal::new(5_600_000_000, 0),
            circulating_supply: Decimal::new(33_000_000_000, 0),
        },
        SeedCoin {
            id: "dogecoin",
            symbol: "doge",
            name: "Dogecoin",
            price: Decimal::new(12, 2),
            market_cap: Decimal::new(17_000_000_000, 0),
            volume: Decimal::new(900_000_000, 0),
            circulating_supply: Decimal::new(144_000_000_000, 0),
        },
        SeedCoin {
            id: "cardano",
            symbol: "ada",
            name: "Cardano",
            price: Decimal::new(38, 2),
            market_cap: Decimal::new(13_500_000_000, 0),
            volume: Decimal::new(350_000_000, 0),
            circulating_supply: Decimal::new(35_500_000_000, 0),
        },
        SeedCoin {
            id: "tron",
            symbol: "trx",
            name: "TRON",
            price: Decimal::new(13, 2),
            market_cap: Decimal::new(11_400_000_000, 0),
            volume: Decimal::new(400_000_000, 0),
            circulating_supply: Decimal::new(87_700_000_000, 0),
        },
    ];
}

fn seed_to_market(rank: usize, seed: &SeedCoin) -> CoinMarket {
    CoinMarket {
        id: seed.id.to_string(),
        symbol: seed.symbol.to_string(),
        name: seed.name.to_string(),
        image: None,
        current_price: seed.price,
        market_cap: seed.market_cap,
        market_cap_rank: Some(rank as u32 + 1),
        total_volume: seed.volume,
        high_24h: None,
        low_24h: None,
        price_change_percentage_24h: Decimal::ZERO,
        circulating_supply: seed.circulating_supply,
        total_supply: None,
        last_updated: Utc::now(),
    }
}

/// Seed markets listing, honoring the request's pagination.
pub(crate) fn markets(params: &MarketsParams) -> Vec<CoinMarket> {
    let per_page = params.per_page as usize;
    let start = (params.page as usize - 1) * per_page;

    SEED_COINS
        .iter()
        .enumerate()
        .skip(start)
        .take(per_page)
        .map(|(rank, seed)| seed_to_market(rank, seed))
        .collect()
}

/// Seed detail for one coin.
///
/// Unknown ids get a zeroed entry with a name derived from the id; a
/// zero price is preferred over inventing one for a coin we know nothing
/// about.
pub(crate) fn coin_detail(coin_id: &str) -> CoinDetail {
    let position = SEED_COINS.iter().position(|seed| seed.id == coin_id);

    match position {
        Some(rank) => {
            let seed = &SEED_COINS[rank];
            CoinDetail {
                id: seed.id.to_string(),
                symbol: seed.symbol.to_string(),
                name: seed.name.to_string(),
                description: None,
                market_cap_rank: Some(rank as u32 + 1),
                market: MarketSummary {
                    current_price: seed.price,
                    market_cap: seed.market_cap,
                    total_volume: seed.volume,
                    price_change_percentage_24h: Decimal::ZERO,
                    circulating_supply: seed.circulating_supply,
                    total_supply: None,
                },
                last_updated: Utc::now(),
            }
        }
        None => CoinDetail {
            id: coin_id.to_string(),
            symbol: coin_id.to_string(),
            name: display_name(coin_id),
            description: None,
            market_cap_rank: None,
            market: MarketSummary {
                current_price: Decimal::ZERO,
                market_cap: Decimal::ZERO,
                total_volume: Decimal::ZERO,
                price_change_percentage_24h: Decimal::ZERO,
                circulating_supply: Decimal::ZERO,
                total_supply: None,
            },
            last_updated: Utc::now(),
        },
    }
}

/// Seed global aggregate, derived from the seed coin table so the numbers
/// stay mutually consistent.
pub(crate) fn global() -> GlobalSnapshot {
    let total_cap: Decimal = SEED_COINS.iter().map(|seed| seed.market_cap).sum();
    let total_volume: Decimal = SEED_COINS.iter().map(|seed| seed.volume).sum();

    let hundred = Decimal::new(100, 0);
    let mut dominance = BTreeMap::new();
    for seed in SEED_COINS.iter().take(2) {
        dominance.insert(
            seed.symbol.to_string(),
            (seed.market_cap * hundred / total_cap).round_dp(2),
        );
    }

    let mut total_market_cap = BTreeMap::new();
    total_market_cap.insert("usd".to_string(), total_cap);
    let mut total_volume_map = BTreeMap::new();
    total_volume_map.insert("usd".to_string(), total_volume);

    GlobalSnapshot {
        active_cryptocurrencies: SEED_COINS.len() as u32,
        markets: 0,
        total_market_cap,
        total_volume: total_volume_map,
        market_cap_percentage: dominance,
        market_cap_change_percentage_24h_usd: Decimal::ZERO,
        updated_at: Utc::now(),
    }
}

/// Seed BTC-based exchange rates, derived from seed prices plus fixed
/// fiat cross rates.
pub(crate) fn exchange_rates() -> ExchangeRates {
    let btc_usd = SEED_COINS[0].price;
    let eth_usd = SEED_COINS[1].price;

    let mut rates = BTreeMap::new();
    rates.insert(
        "usd".to_string(),
        RateInfo {
            name: "US Dollar".to_string(),
            unit: "$".to_string(),
            value: btc_usd,
            rate_type: "fiat".to_string(),
        },
    );
    rates.insert(
        "eur".to_string(),
        RateInfo {
            name: "Euro".to_string(),
            unit: "\u{20ac}".to_string(),
            value: (btc_usd * Decimal::new(92, 2)).round_dp(2),
            rate_type: "fiat".to_string(),
        },
    );
    rates.insert(
        "gbp".to_string(),
        RateInfo {
            name: "British Pound Sterling".to_string(),
            unit: "\u{00a3}".to_string(),
            value: (btc_usd * Decimal::new(79, 2)).round_dp(2),
            rate_type: "fiat".to_string(),
        },
    );
    rates.insert(
        "eth".to_string(),
        RateInfo {
            name: "Ether".to_string(),
            unit: "eth".to_string(),
            value: (btc_usd / eth_usd).round_dp(6),
            rate_type: "crypto".to_string(),
        },
    );
    rates.insert(
        "btc".to_string(),
        RateInfo {
            name: "Bitcoin".to_string(),
            unit: "btc".to_string(),
            value: Decimal::ONE,
            rate_type: "crypto".to_string(),
        },
    );

    ExchangeRates { rates }
}

/// Seed chart: a flat daily series at the coin's seed price.
pub(crate) fn chart(coin_id: &str, params: &ChartParams) -> MarketChart {
    let seed = SEED_COINS.iter().find(|seed| seed.id == coin_id);
    let price = seed.map(|s| s.price).unwrap_or(Decimal::ZERO);
    let volume = seed.map(|s| s.volume).unwrap_or(Decimal::ZERO);

    let now = Utc::now();
    let mut prices = Vec::with_capacity(params.days as usize + 1);
    let mut volumes = Vec::with_capacity(params.days as usize + 1);

    for offset in (0..=params.days).rev() {
        let timestamp = now - ChronoDuration::days(offset as i64);
        prices.push(ChartPoint {
            timestamp,
            value: price,
        });
        volumes.push(ChartPoint {
            timestamp,
            value: volume,
        });
    }

    MarketChart {
        prices,
        total_volumes: volumes,
    }
}

fn display_name(coin_id: &str) -> String {
    coin_id
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
