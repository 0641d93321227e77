use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Market, MarketKind, OptionPool, Outcome, Selection, StatisticsSnapshot};

/// Probabilities are clamped to [0.1, 99.9]: a parimutuel pool can never
/// guarantee certainty before resolution, so the quote never shows it.
const PROB_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 1); // 0.1
const PROB_CEIL: Decimal = Decimal::from_parts(999, 0, 0, false, 1); // 99.9

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Projected result of a candidate wager against the current pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedReturn {
    pub estimated_payout: Decimal,
    pub net_profit: Decimal,
}

/// A render-ready price quote for a candidate (selection, amount).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub probability: Decimal,
    pub estimated_payout: Decimal,
    pub net_profit: Decimal,
}

fn clamp_probability(p: Decimal) -> Decimal {
    p.max(PROB_FLOOR).min(PROB_CEIL).round_dp(2).normalize()
}

/// Probability of one option in a Binary/MultipleChoice market.
///
/// The liquidity parameter is split evenly across options as a phantom
/// stake, so a zero-volume market still quotes `100 / option_count`.
pub fn flat_probability(
    option_shares: Decimal,
    total_shares: Decimal,
    liquidity_param: Decimal,
    option_count: usize,
) -> Decimal {
    if option_count == 0 {
        return Decimal::ZERO;
    }
    let count = Decimal::from(option_count as u64);
    let denominator = total_shares + liquidity_param;
    if denominator.is_zero() {
        return clamp_probability(HUNDRED / count);
    }
    let per_option = liquidity_param / count;
    clamp_probability((option_shares + per_option) / denominator * HUNDRED)
}

/// Probability of one outcome of a Nested option's yes/no sub-market.
///
/// Half the liquidity parameter backs each side; with no real volume both
/// sides quote 50. The No side is quoted as the exact complement of Yes so
/// the pair always sums to 100.
pub fn nested_probability(
    yes_shares: Decimal,
    no_shares: Decimal,
    liquidity_param: Decimal,
    outcome: Outcome,
) -> Decimal {
    let denominator = yes_shares + no_shares + liquidity_param;
    let yes = if denominator.is_zero() {
        Decimal::from(50)
    } else {
        let half = liquidity_param / Decimal::from(2);
        clamp_probability((yes_shares + half) / denominator * HUNDRED)
    };

    match outcome {
        Outcome::Yes => yes,
        Outcome::No => HUNDRED - yes,
    }
}

/// Probability of a selection against a snapshot. `None` when the selection
/// doesn't match the snapshot's shape (bad index, missing outcome).
pub fn selection_probability(
    kind: MarketKind,
    pools: &[OptionPool],
    liquidity_param: Decimal,
    selection: Selection,
) -> Option<Decimal> {
    let pool = pools.get(selection.option_index)?;

    match (kind, pool) {
        (MarketKind::Nested, OptionPool::Nested { yes_shares, no_shares }) => {
            let outcome = selection.outcome?;
            Some(nested_probability(*yes_shares, *no_shares, liquidity_param, outcome))
        }
        (MarketKind::Binary | MarketKind::MultipleChoice, OptionPool::Flat { shares }) => {
            let total: Decimal = pools.iter().map(|p| p.total()).sum();
            Some(flat_probability(*shares, total, liquidity_param, pools.len()))
        }
        _ => None,
    }
}

/// Parimutuel projection for a candidate wager.
///
/// The wager joins both the total pool and the winner-side pool; the
/// liquidity subsidy is deducted before distribution because it goes back
/// to the market creator at resolution. Until the pool has grown past the
/// subsidy there is nothing to win and the projection is zero.
pub fn projected_return(
    pool_volume: Decimal,
    winner_shares: Decimal,
    liquidity_param: Decimal,
    amount: Decimal,
) -> ProjectedReturn {
    let new_pool = pool_volume + amount;
    let new_winner_pool = winner_shares + amount;
    let distributable = new_pool - liquidity_param;

    if new_winner_pool > Decimal::ZERO && distributable > Decimal::ZERO {
        let estimated_payout = (amount / new_winner_pool * distributable)
            .round_dp(2)
            .normalize();
        let net_profit = (estimated_payout - amount).max(Decimal::ZERO).normalize();
        ProjectedReturn {
            estimated_payout,
            net_profit,
        }
    } else {
        ProjectedReturn {
            estimated_payout: Decimal::ZERO,
            net_profit: Decimal::ZERO,
        }
    }
}

/// Full quote for a candidate (selection, amount) against a snapshot.
///
/// For Nested markets the projection runs against the chosen option's own
/// sub-market pool; flat markets project against the whole market.
pub fn quote(
    market: &Market,
    snapshot: &StatisticsSnapshot,
    selection: Selection,
    amount: Decimal,
) -> Option<Quote> {
    let probability =
        selection_probability(market.kind, &snapshot.pools, market.liquidity_param, selection)?;

    let (pool_volume, winner_shares) = match snapshot.pools.get(selection.option_index)? {
        OptionPool::Flat { shares } => (snapshot.total_volume, *shares),
        OptionPool::Nested { yes_shares, no_shares } => {
            let winner = match selection.outcome? {
                Outcome::Yes => *yes_shares,
                Outcome::No => *no_shares,
            };
            (*yes_shares + *no_shares, winner)
        }
    };

    let projection = projected_return(pool_volume, winner_shares, market.liquidity_param, amount);

    Some(Quote {
        probability,
        estimated_payout: projection.estimated_payout,
        net_profit: projection.net_profit,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_flat_probabilities_sum_to_100() {
        let shares = [dec(400), dec(100), dec(250)];
        let total: Decimal = shares.iter().copied().sum();
        let sum: Decimal = shares
            .iter()
            .map(|s| flat_probability(*s, total, dec(100), shares.len()))
            .sum();

        // Within rounding of the 2dp quotes
        assert!((sum - HUNDRED).abs() < Decimal::new(5, 2), "sum was {sum}");
    }

    #[test]
    fn test_nested_pair_sums_exactly_100() {
        let yes = nested_probability(dec(321), dec(87), dec(60), Outcome::Yes);
        let no = nested_probability(dec(321), dec(87), dec(60), Outcome::No);
        assert_eq!(yes + no, HUNDRED);
    }

    #[test]
    fn test_zero_volume_flat_quotes_even_odds() {
        // No real shares: the subsidy alone prices every option at 100/n
        assert_eq!(flat_probability(dec(0), dec(0), dec(100), 2), dec(50));
        assert_eq!(flat_probability(dec(0), dec(0), dec(100), 4), dec(25));
        // Even with zero liquidity there is no division by zero
        assert_eq!(flat_probability(dec(0), dec(0), dec(0), 2), dec(50));
    }

    #[test]
    fn test_zero_volume_nested_quotes_50() {
        assert_eq!(nested_probability(dec(0), dec(0), dec(100), Outcome::Yes), dec(50));
        assert_eq!(nested_probability(dec(0), dec(0), dec(0), Outcome::No), dec(50));
    }

    #[test]
    fn test_probability_clamped_away_from_certainty() {
        let p = flat_probability(dec(1_000_000), dec(1_000_000), dec(0), 2);
        assert_eq!(p, Decimal::new(999, 1)); // 99.9, never 100
        let q = flat_probability(dec(0), dec(1_000_000), dec(0), 2);
        assert_eq!(q, Decimal::new(1, 1)); // 0.1, never 0
    }

    #[test]
    fn test_fresh_market_wager_recovers_no_subsidy() {
        // liquidity 100, empty pool: $50 on A leaves distributable at -50,
        // so nothing is projected
        let r = projected_return(dec(0), dec(0), dec(100), dec(50));
        assert_eq!(r.estimated_payout, Decimal::ZERO);
        assert_eq!(r.net_profit, Decimal::ZERO);
    }

    #[test]
    fn test_worked_binary_scenario() {
        // A=400, B=100, volume=500, liquidity=100
        let p = flat_probability(dec(400), dec(500), dec(100), 2);
        assert_eq!(p, dec(75));

        // $100 more on A: winner pool 500, distributable 500, payout 100
        let r = projected_return(dec(500), dec(400), dec(100), dec(100));
        assert_eq!(r.estimated_payout, dec(100));
        assert_eq!(r.net_profit, Decimal::ZERO);
    }

    #[test]
    fn test_projection_profitable_when_pool_is_deep() {
        // Winner side is thin relative to the pool: profit is positive
        let r = projected_return(dec(1_000), dec(100), dec(100), dec(50));
        // payout = 50/150 × 950 = 316.67
        assert_eq!(r.estimated_payout, Decimal::new(31667, 2));
        assert_eq!(r.net_profit, Decimal::new(26667, 2));
    }

    #[test]
    fn test_nested_quote_projects_against_sub_market() {
        use crate::models::{MarketOption, Provenance};
        use chrono::Utc;

        let market = Market {
            id: "m1".into(),
            contract_address: "0xabc".into(),
            question: "Who wins?".into(),
            kind: MarketKind::Nested,
            options: vec![
                MarketOption { title: "A".into() },
                MarketOption { title: "B".into() },
            ],
            liquidity_param: dec(100),
            min_wager: Decimal::ONE,
            max_wager: dec(1_000),
            ends_at: Utc::now(),
            is_active: true,
            is_resolved: false,
            winning_option: None,
            winning_outcome: None,
        };
        let snapshot = StatisticsSnapshot {
            market_id: "m1".into(),
            total_volume: dec(500),
            pools: vec![
                OptionPool::Nested { yes_shares: dec(300), no_shares: dec(100) },
                OptionPool::Nested { yes_shares: dec(50), no_shares: dec(50) },
            ],
            unique_traders: 4,
            provenance: Provenance::OracleDecrypted,
            oracle_version: 1,
            fetched_at: Utc::now(),
        };

        let q = quote(
            &market,
            &snapshot,
            Selection { option_index: 0, outcome: Some(Outcome::Yes) },
            dec(100),
        )
        .unwrap();

        // (300 + 50) / (300 + 100 + 100) = 70%
        assert_eq!(q.probability, dec(70));
        // Sub-market pool 400: newWinner=400, distributable=500-100=400,
        // payout = 100/400 × 400 = 100
        assert_eq!(q.estimated_payout, dec(100));
        assert_eq!(q.net_profit, Decimal::ZERO);
    }

    #[test]
    fn test_selection_probability_rejects_bad_shapes() {
        let pools = vec![
            OptionPool::Flat { shares: dec(10) },
            OptionPool::Flat { shares: dec(30) },
        ];
        // Out-of-range index
        assert!(selection_probability(
            MarketKind::Binary,
            &pools,
            dec(100),
            Selection { option_index: 5, outcome: None },
        )
        .is_none());

        // Nested selection without an outcome
        let nested = vec![OptionPool::Nested {
            yes_shares: dec(5),
            no_shares: dec(5),
        }];
        assert!(selection_probability(
            MarketKind::Nested,
            &nested,
            dec(100),
            Selection { option_index: 0, outcome: None },
        )
        .is_none());
    }
}
