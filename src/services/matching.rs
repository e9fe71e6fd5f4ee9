use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::validation::ObjectId;

/// A bank-statement line prepared for matching, amount already in account currency
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub id: ObjectId,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPair {
    pub transaction_id: ObjectId,
    pub entry_id: ObjectId,
}

/// Pairs bank transactions with ledger entries. Each side is used at most once.
pub trait BankMatcher: Send + Sync {
    fn match_transactions(&self, transactions: &[MatchCandidate], entries: &[MatchCandidate]) -> Vec<MatchPair>;
}

/// Exact amount within a date window; closest date wins, a shared reference
/// breaks ties, then the earlier entry.
#[derive(Debug, Clone)]
pub struct AmountDateMatcher {
    pub window_days: i64,
}

impl AmountDateMatcher {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }
}

impl BankMatcher for AmountDateMatcher {
    fn match_transactions(&self, transactions: &[MatchCandidate], entries: &[MatchCandidate]) -> Vec<MatchPair> {
        let mut ordered: Vec<&MatchCandidate> = transactions.iter().collect();
        ordered.sort_by_key(|t| t.date);

        let mut used = vec![false; entries.len()];
        let mut pairs = Vec::new();

        for tx in ordered {
            let best = entries
                .iter()
                .enumerate()
                .filter(|(i, entry)| !used[*i] && entry.amount == tx.amount)
                .map(|(i, entry)| {
                    let gap = (entry.date - tx.date).num_days().abs();
                    let same_reference = match (&tx.reference, &entry.reference) {
                        (Some(a), Some(b)) => !a.is_empty() && a.eq_ignore_ascii_case(b),
                        _ => false,
                    };
                    (i, gap, same_reference)
                })
                .filter(|(_, gap, _)| *gap <= self.window_days)
                .min_by_key(|(i, gap, same_reference)| (*gap, !*same_reference, *i));

            if let Some((i, _, _)) = best {
                used[i] = true;
                pairs.push(MatchPair {
                    transaction_id: tx.id.clone(),
                    entry_id: entries[i].id.clone(),
                });
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(day: u32, cents: i64, reference: Option<&str>) -> MatchCandidate {
        MatchCandidate {
            id: ObjectId::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            amount: Decimal::new(cents, 2),
            reference: reference.map(str::to_string),
        }
    }

    #[test]
    fn matches_exact_amounts_inside_window() {
        let txs = vec![candidate(10, 15000, None)];
        let entries = vec![candidate(20, 15000, None), candidate(12, 15000, None), candidate(10, 14999, None)];
        let pairs = AmountDateMatcher::new(5).match_transactions(&txs, &entries);
        assert_eq!(pairs, vec![MatchPair { transaction_id: txs[0].id.clone(), entry_id: entries[1].id.clone() }]);
    }

    #[test]
    fn each_entry_is_used_once() {
        let txs = vec![candidate(5, -5000, None), candidate(6, -5000, None)];
        let entries = vec![candidate(5, -5000, None)];
        let pairs = AmountDateMatcher::new(3).match_transactions(&txs, &entries);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].transaction_id, txs[0].id);
    }

    #[test]
    fn reference_breaks_date_ties() {
        let txs = vec![candidate(10, 2500, Some("INV-7"))];
        let entries = vec![candidate(11, 2500, Some("INV-6")), candidate(9, 2500, Some("inv-7"))];
        let pairs = AmountDateMatcher::new(3).match_transactions(&txs, &entries);
        assert_eq!(pairs[0].entry_id, entries[1].id);
    }

    #[test]
    fn nothing_matches_outside_window() {
        let txs = vec![candidate(1, 100, None)];
        let entries = vec![candidate(30, 100, None)];
        assert!(AmountDateMatcher::new(5).match_transactions(&txs, &entries).is_empty());
    }
}
