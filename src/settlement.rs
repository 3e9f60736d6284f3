use crate::balance::Balance;
use crate::money::Money;
use crate::schemas::UserNick;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One payment that moves money from a debtor to a creditor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: UserNick,
    pub to: UserNick,
    pub amount: Money,
}

#[derive(Clone, Debug)]
struct PersonalBalance {
    id: UserNick,
    balance: Money,
}

/// Reduces balances to a short list of payments that zero them all.
///
/// Members are sorted from largest debtor to largest creditor (stable, so
/// ties keep the balance map's order) and matched greedily from both ends.
/// For `n` members with a non-zero balance at most `n - 1` payments come
/// out. The balances are expected to sum to zero; if they don't, the
/// leftover is simply not settled and no zero or negative payment is made.
pub fn simplify(balances: &Balance) -> Vec<Transaction> {
    let mut people: Vec<PersonalBalance> = balances
        .iter()
        .map(|(id, balance)| PersonalBalance {
            id: id.clone(),
            balance: Money::round(balance.amount()),
        })
        .filter(|p| !p.balance.is_zero())
        .collect();

    let drift: Money = people.iter().map(|p| p.balance).sum();
    if !drift.is_zero() {
        warn!(%drift, "balances do not sum to zero, leaving the remainder unsettled");
    }

    people.sort_by(|a, b| a.balance.cmp(&b.balance));

    let mut transactions = Vec::new();
    if people.is_empty() {
        return transactions;
    }

    let (mut i, mut j) = (0, people.len() - 1);
    while i < j {
        if !people[i].balance.is_negative() || !people[j].balance.is_positive() {
            break;
        }
        let debt = people[i].balance.abs();
        let credit = people[j].balance;

        let amount = debt.min(credit);
        transactions.push(Transaction {
            from: people[i].id.clone(),
            to: people[j].id.clone(),
            amount,
        });

        if debt < credit {
            people[j].balance = credit - debt;
            i += 1;
        } else if debt > credit {
            people[i].balance = -(debt - credit);
            j -= 1;
        } else {
            i += 1;
            j -= 1;
        }
    }

    debug!(
        members = balances.len(),
        transactions = transactions.len(),
        "simplified debts"
    );
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balances(values: &[(&str, i64)]) -> Balance {
        values
            .iter()
            .map(|(k, cents)| (k.to_string(), Money::from_cents(*cents)))
            .collect()
    }

    fn replay(transactions: &[Transaction]) -> Balance {
        let mut ledger = Balance::new();
        for t in transactions {
            *ledger.entry(t.from.clone()).or_insert(Money::ZERO) -= t.amount;
            *ledger.entry(t.to.clone()).or_insert(Money::ZERO) += t.amount;
        }
        ledger
    }

    fn non_zero(balance: &Balance) -> Balance {
        balance
            .iter()
            .filter(|(_, m)| !m.is_zero())
            .map(|(k, m)| (k.clone(), *m))
            .collect()
    }

    #[test]
    fn test_settles_scenario_balances() {
        let input = balances(&[("alice", -1000), ("bob", 29000), ("carol", -28000)]);
        let transactions = simplify(&input);
        assert_eq!(
            transactions,
            vec![
                Transaction {
                    from: "carol".to_string(),
                    to: "bob".to_string(),
                    amount: Money::round(dec!(280)),
                },
                Transaction {
                    from: "alice".to_string(),
                    to: "bob".to_string(),
                    amount: Money::round(dec!(10)),
                },
            ]
        );
        assert_eq!(replay(&transactions), input);
    }

    #[test]
    fn test_debtor_larger_than_creditor() {
        let input = balances(&[("a", -9000), ("b", 3000), ("c", 6000)]);
        let transactions = simplify(&input);
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].to, "c");
        assert_eq!(transactions[0].amount, Money::from_cents(6000));
        assert_eq!(transactions[1].to, "b");
        assert_eq!(replay(&transactions), input);
    }

    #[test]
    fn test_zero_balances_are_skipped() {
        let input = balances(&[("a", -500), ("idle", 0), ("b", 500)]);
        let transactions = simplify(&input);
        assert_eq!(transactions.len(), 1);
        assert!(transactions.iter().all(|t| t.from != "idle" && t.to != "idle"));
    }

    #[test]
    fn test_all_settled_gives_nothing() {
        assert!(simplify(&balances(&[("a", 0), ("b", 0)])).is_empty());
        assert!(simplify(&Balance::new()).is_empty());
    }

    #[test]
    fn test_ties_keep_map_order() {
        let input = balances(&[("a", -100), ("b", -100), ("c", 200)]);
        let transactions = simplify(&input);
        assert_eq!(transactions[0].from, "a");
        assert_eq!(transactions[1].from, "b");
    }

    #[test]
    fn test_at_most_n_minus_one() {
        let input = balances(&[("a", -100), ("b", -250), ("c", 75), ("d", 175), ("e", 100)]);
        let transactions = simplify(&input);
        assert!(transactions.len() <= 4);
        assert_eq!(replay(&transactions), non_zero(&input));
    }

    #[test]
    fn test_drift_never_produces_bad_legs() {
        let input = balances(&[("a", -100), ("b", -100), ("c", 199)]);
        let transactions = simplify(&input);
        assert!(transactions.iter().all(|t| t.amount.is_positive()));

        let only_debtors = balances(&[("a", -100), ("b", -100)]);
        assert!(simplify(&only_debtors).is_empty());
    }
}
