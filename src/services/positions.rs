use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{
    LocalWagerRecord, Market, Outcome, PositionAggregate, Selection, StatisticsSnapshot,
};
use crate::pricing;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

fn group_key(record: &LocalWagerRecord) -> (usize, Option<Outcome>) {
    (record.option_index, record.outcome)
}

/// Group ledger records into render-ready position aggregates.
///
/// Recomputed from scratch on every ledger or statistics change. When the
/// snapshot is degraded the mark and PnL are withheld rather than computed
/// from zero-placeholder pools.
pub fn aggregate_positions(
    market: &Market,
    snapshot: &StatisticsSnapshot,
    wagers: &[LocalWagerRecord],
) -> Vec<PositionAggregate> {
    let mut groups: BTreeMap<(usize, Option<Outcome>), Vec<&LocalWagerRecord>> = BTreeMap::new();
    for record in wagers {
        groups.entry(group_key(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|((option_index, outcome), records)| {
            let total_amount: Decimal = records.iter().map(|r| r.amount).sum();

            // Shares derive from the entry price; without one for every
            // record the count is an undercount and is flagged unavailable.
            let mut shares = Decimal::ZERO;
            let mut shares_known = true;
            for record in &records {
                match record.price_at_wager {
                    Some(price) if price > Decimal::ZERO => {
                        shares += record.amount / (price / HUNDRED);
                    }
                    _ => shares_known = false,
                }
            }
            if !shares_known {
                shares = Decimal::ZERO;
            }

            let current_probability = pricing::selection_probability(
                market.kind,
                &snapshot.pools,
                market.liquidity_param,
                Selection {
                    option_index,
                    outcome,
                },
            );

            let (current_value, pnl) = match current_probability {
                Some(prob) if shares_known && !snapshot.is_degraded() => {
                    let value = (shares * prob / HUNDRED).round_dp(2);
                    (Some(value), Some(value - total_amount))
                }
                _ => (None, None),
            };

            let option_title = market
                .options
                .get(option_index)
                .map(|o| o.title.clone())
                .unwrap_or_default();

            PositionAggregate {
                option_index,
                outcome,
                option_title,
                total_amount,
                shares: shares.round_dp(2),
                shares_known,
                wager_count: records.len(),
                current_probability,
                current_value,
                pnl,
            }
        })
        .collect()
}
