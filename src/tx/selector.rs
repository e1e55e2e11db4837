//! Largest-first coin selection with a single overshoot output

use crate::error::{RelayerError, RelayerResult};
use crate::rpc::{RpcUnspent, Unspent, UnspentBalance};
use crate::types::{Fixed8, UInt256};

use tracing::debug;

/// Unspents chosen to cover a required amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Vec<Unspent>,
    pub total: Fixed8,
}

impl Selection {
    pub fn empty() -> Self {
        Self {
            chosen: Vec::new(),
            total: Fixed8::ZERO,
        }
    }
}

pub struct CoinSelector;

impl CoinSelector {
    /// The balance entry for `asset_id` among an address's holdings
    pub fn find_balance<'a>(
        unspents: &'a RpcUnspent,
        asset_id: &UInt256,
    ) -> RelayerResult<&'a UnspentBalance> {
        let wanted = asset_id.to_string();
        unspents
            .balances
            .iter()
            .find(|balance| {
                let hash = balance.asset_hash.strip_prefix("0x").unwrap_or(&balance.asset_hash);
                format!("0x{}", hash.to_lowercase()) == wanted
            })
            .ok_or(RelayerError::AssetNotFound { asset: wanted })
    }

    /// Pick unspents covering `required`
    ///
    /// Sorted by value descending (stable, so equal values keep listing
    /// order). Outputs are taken while each fits in what is still owed; if
    /// that leaves a remainder, the smallest output that covers it is added.
    /// Only one overshoot output is ever added.
    pub fn select_inputs(unspents: &[Unspent], required: Fixed8) -> RelayerResult<Selection> {
        if required < Fixed8::ZERO {
            return Err(RelayerError::InvalidAmount(format!(
                "required amount {} is negative",
                required
            )));
        }

        if let Some(negative) = unspents.iter().find(|u| u.value.is_negative()) {
            return Err(RelayerError::InvalidAmount(format!(
                "unspent {}:{} has negative value {}",
                negative.txid, negative.n, negative.value
            )));
        }

        let available = checked_total(unspents)?;
        if available < required {
            return Err(RelayerError::InsufficientFunds {
                available,
                required,
            });
        }

        let mut ordered: Vec<&Unspent> = unspents.iter().collect();
        ordered.sort_by(|a, b| b.value.cmp(&a.value));

        let mut remainder = required;
        let mut taken = 0;
        while taken < ordered.len() && ordered[taken].value <= remainder {
            remainder -= ordered[taken].value;
            taken += 1;
        }

        let mut chosen: Vec<Unspent> = ordered[..taken].iter().map(|u| (*u).clone()).collect();
        if !remainder.is_zero() {
            let overshoot = ordered
                .iter()
                .rev()
                .find(|u| u.value >= remainder)
                .ok_or(RelayerError::InsufficientFunds {
                    available,
                    required,
                })?;
            chosen.push((*overshoot).clone());
        }

        let total = checked_total(&chosen)?;
        debug!(
            "Selected {} of {} unspents: total {} for required {}",
            chosen.len(),
            unspents.len(),
            total,
            required
        );

        Ok(Selection { chosen, total })
    }
}

/// Sum of unspent values; node-supplied, so overflow is a parse failure
fn checked_total(unspents: &[Unspent]) -> RelayerResult<Fixed8> {
    unspents.iter().try_fold(Fixed8::ZERO, |acc, u| {
        acc.checked_add(u.value).ok_or_else(|| {
            RelayerError::Parse(format!("unspent values overflow at {}:{}", u.txid, u.n))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unspents(values: &[i64]) -> Vec<Unspent> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Unspent {
                txid: format!("{:064x}", i + 1),
                n: i as u16,
                value: Fixed8::from_units(*v),
            })
            .collect()
    }

    fn values(selection: &Selection) -> Vec<i64> {
        selection
            .chosen
            .iter()
            .map(|u| u.value.raw() / 100_000_000)
            .collect()
    }

    #[test]
    fn test_single_large_output_covers_small_requirement() {
        let selection =
            CoinSelector::select_inputs(&unspents(&[5, 3, 3, 1]), Fixed8::from_units(4)).unwrap();
        assert_eq!(values(&selection), vec![5]);
        assert_eq!(selection.total, Fixed8::from_units(5));
    }

    #[test]
    fn test_exact_cover_stops_without_overshoot() {
        let selection =
            CoinSelector::select_inputs(&unspents(&[2, 2, 2]), Fixed8::from_units(4)).unwrap();
        assert_eq!(values(&selection), vec![2, 2]);
        assert_eq!(selection.total, Fixed8::from_units(4));
    }

    #[test]
    fn test_prefix_plus_smallest_covering_output() {
        // take 5 (owes 2), 3 > 2 stops the walk, smallest >= 2 is the 2
        let selection =
            CoinSelector::select_inputs(&unspents(&[1, 5, 3, 2]), Fixed8::from_units(7)).unwrap();
        assert_eq!(values(&selection), vec![5, 2]);
        assert_eq!(selection.total, Fixed8::from_units(7));

        // take 5 (owes 1.5), smallest >= 1.5 is the 3
        let selection = CoinSelector::select_inputs(
            &unspents(&[5, 3, 1]),
            "6.5".parse::<Fixed8>().unwrap(),
        )
        .unwrap();
        assert_eq!(values(&selection), vec![5, 3]);
        assert_eq!(selection.total, Fixed8::from_units(8));
    }

    #[test]
    fn test_ties_keep_listing_order() {
        let list = unspents(&[2, 2, 2]);
        let selection = CoinSelector::select_inputs(&list, Fixed8::from_units(3)).unwrap();
        assert_eq!(selection.chosen[0], list[0]);
        // the overshoot is the last output in sort order that covers the remainder
        assert_eq!(selection.chosen[1], list[2]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let list = unspents(&[4, 1, 7, 3, 3, 9, 2]);
        let first = CoinSelector::select_inputs(&list, Fixed8::from_units(15)).unwrap();
        for _ in 0..10 {
            assert_eq!(
                CoinSelector::select_inputs(&list, Fixed8::from_units(15)).unwrap(),
                first
            );
        }
    }

    #[test]
    fn test_greedy_minimality() {
        let list = unspents(&[4, 1, 7, 3, 3, 9, 2, 6]);
        let available: i64 = 35;
        for required in 1..=available {
            let required = Fixed8::from_units(required);
            let selection = CoinSelector::select_inputs(&list, required).unwrap();
            assert!(selection.total >= required);

            if selection.chosen.len() > 1 {
                let largest = selection.chosen.iter().map(|u| u.value).max().unwrap();
                assert!(selection.total - largest <= required);
            }
        }
    }

    #[test]
    fn test_insufficient_funds() {
        let result = CoinSelector::select_inputs(&unspents(&[1, 2]), Fixed8::from_units(4));
        match result {
            Err(RelayerError::InsufficientFunds {
                available,
                required,
            }) => {
                assert_eq!(available, Fixed8::from_units(3));
                assert_eq!(required, Fixed8::from_units(4));
            }
            other => panic!("expected insufficient funds, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_requirement_selects_nothing() {
        let selection = CoinSelector::select_inputs(&unspents(&[3, 1]), Fixed8::ZERO).unwrap();
        assert_eq!(selection, Selection::empty());

        let selection = CoinSelector::select_inputs(&[], Fixed8::ZERO).unwrap();
        assert!(selection.chosen.is_empty());
    }

    #[test]
    fn test_negative_requirement_rejected() {
        assert!(matches!(
            CoinSelector::select_inputs(&unspents(&[3]), Fixed8::from_raw(-1)),
            Err(RelayerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_overflowing_unspent_total_is_parse_error() {
        let huge = |n: u16| Unspent {
            txid: format!("{:064x}", n),
            n,
            value: Fixed8::from_raw(i64::MAX),
        };
        let result = CoinSelector::select_inputs(&[huge(0), huge(1)], Fixed8::from_units(1));
        assert!(matches!(result, Err(RelayerError::Parse(_))));
    }

    #[test]
    fn test_negative_unspent_value_rejected() {
        let mut list = unspents(&[3, 1]);
        list[1].value = Fixed8::from_raw(-5);
        assert!(matches!(
            CoinSelector::select_inputs(&list, Fixed8::from_units(2)),
            Err(RelayerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_find_balance_matches_prefixed_asset_id() {
        let asset: UInt256 = "0x602c79718b16e442de58778e148d0b1084e3b2dffd5de6b7b16cee7969282de7"
            .parse()
            .unwrap();
        let holdings = RpcUnspent {
            address: "AQzRMe3zyGS8W177xLJfewRRQZY2kddMun".to_string(),
            balances: vec![
                UnspentBalance {
                    asset_hash: "c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b"
                        .to_string(),
                    asset: "NEO".to_string(),
                    asset_symbol: "NEO".to_string(),
                    amount: Fixed8::from_units(100),
                    unspents: vec![],
                },
                UnspentBalance {
                    asset_hash: "602c79718b16e442de58778e148d0b1084e3b2dffd5de6b7b16cee7969282de7"
                        .to_string(),
                    asset: "GAS".to_string(),
                    asset_symbol: "GAS".to_string(),
                    amount: Fixed8::from_units(3),
                    unspents: unspents(&[3]),
                },
            ],
        };

        let balance = CoinSelector::find_balance(&holdings, &asset).unwrap();
        assert_eq!(balance.asset_symbol, "GAS");

        let missing = UInt256::from_le_bytes([9u8; 32]);
        assert!(matches!(
            CoinSelector::find_balance(&holdings, &missing),
            Err(RelayerError::AssetNotFound { .. })
        ));
    }
}
