//! Property tests for the balance and settlement invariants.

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use splitledger::balance::{aggregate, Balance};
use splitledger::money::Money;
use splitledger::schemas::{Expense, ExpenseDraft, Group};
use splitledger::settlement::simplify;
use splitledger::split::{compute, validate, SplitDetails, SplitPolicy};
use std::collections::BTreeSet;

fn cents(value: i64) -> Money {
    Money::from_cents(value)
}

fn member(i: usize) -> String {
    format!("m{i:02}")
}

fn members(n: usize) -> Vec<String> {
    (0..n).map(member).collect()
}

/// Percentages proportional to `weights` that add up to exactly 100.
/// Zero weights stay at zero; the drift lands on the first non-zero weight.
fn percentages(weights: &[u32]) -> Vec<Decimal> {
    let total: u32 = weights.iter().sum();
    let mut out: Vec<Decimal> = weights
        .iter()
        .map(|w| {
            (Decimal::from(*w) * Decimal::ONE_HUNDRED / Decimal::from(total))
                .round_dp_with_strategy(3, RoundingStrategy::ToZero)
        })
        .collect();
    let drift = Decimal::ONE_HUNDRED - out.iter().sum::<Decimal>();
    if let Some(first) = weights.iter().position(|w| *w != 0) {
        out[first] += drift;
    }
    out
}

fn zero_sum_balances() -> impl Strategy<Value = Balance> {
    prop::collection::vec(-100_000i64..100_000, 1..40).prop_map(|values| {
        let mut balance: Balance = values
            .iter()
            .enumerate()
            .map(|(i, v)| (member(i), cents(*v)))
            .collect();
        let sum: i64 = values.iter().sum();
        balance.insert(member(values.len()), cents(-sum));
        balance
    })
}

fn replay(balance: &Balance) -> Balance {
    let mut ledger = Balance::new();
    for t in simplify(balance) {
        *ledger.entry(t.from).or_insert(Money::ZERO) -= t.amount;
        *ledger.entry(t.to).or_insert(Money::ZERO) += t.amount;
    }
    ledger
}

proptest! {
    #[test]
    fn equal_split_conserves_total(total in 1i64..10_000_000, n in 1usize..=60) {
        let details: SplitDetails = members(n).into_iter().map(|m| (m, Decimal::ONE)).collect();
        let total = cents(total);
        prop_assert!(validate(total, SplitPolicy::Equal, &details));
        let amounts = compute(total, SplitPolicy::Equal, &details).unwrap();
        prop_assert_eq!(amounts.values().sum::<Money>(), total);
        prop_assert_eq!(amounts.len(), n);
        prop_assert!(amounts.values().all(|m| !m.is_negative()));
    }

    #[test]
    fn percentage_split_conserves_total(
        total in 1i64..10_000_000,
        weights in prop::collection::vec(0u32..1000, 1..=60),
    ) {
        prop_assume!(weights.iter().any(|w| *w != 0));
        let names = members(weights.len());
        let details: SplitDetails = names.into_iter().zip(percentages(&weights)).collect();
        let total = cents(total);
        prop_assert!(validate(total, SplitPolicy::Percentage, &details));
        let amounts = compute(total, SplitPolicy::Percentage, &details).unwrap();
        prop_assert_eq!(amounts.values().sum::<Money>(), total);
        prop_assert!(amounts.values().all(|m| !m.is_negative()));
        for (name, pct) in &details {
            if pct.is_zero() {
                prop_assert_eq!(amounts[name], Money::ZERO);
            }
        }
    }

    #[test]
    fn fixed_split_conserves_total(parts in prop::collection::vec(0i64..1_000_000, 1..=60)) {
        prop_assume!(parts.iter().any(|p| *p != 0));
        let names = members(parts.len());
        let details: SplitDetails = names
            .into_iter()
            .zip(parts.iter().map(|p| Decimal::new(*p, 2)))
            .collect();
        let total = cents(parts.iter().sum());
        prop_assert!(validate(total, SplitPolicy::Fixed, &details));
        let amounts = compute(total, SplitPolicy::Fixed, &details).unwrap();
        prop_assert_eq!(amounts.values().sum::<Money>(), total);
        prop_assert!(amounts.values().all(|m| !m.is_negative()));
    }

    #[test]
    fn balances_are_zero_sum(
        expenses in prop::collection::vec((1i64..1_000_000, 0usize..4, 1usize..=4), 0..20),
    ) {
        let names = members(4);
        let group = Group {
            id: "g".to_string(),
            name: "Props".to_string(),
            members: names.iter().cloned().collect::<BTreeSet<_>>(),
        };
        let expenses: Vec<Expense> = expenses
            .into_iter()
            .enumerate()
            .map(|(i, (amount, payer, n))| {
                let draft = ExpenseDraft {
                    description: format!("expense {i}"),
                    amount: Decimal::new(amount, 2),
                    paid_by: names[payer].clone(),
                    split_type: "equal".to_string(),
                    split_details: names[..n].iter().map(|m| (m.clone(), Decimal::ONE)).collect(),
                };
                Expense::new(format!("e{i}"), &group, draft).unwrap()
            })
            .collect();
        let balance = aggregate(&group.members, &expenses);
        prop_assert_eq!(balance.values().sum::<Money>(), Money::ZERO);
        prop_assert_eq!(balance.len(), 4);
    }

    #[test]
    fn settlement_reproduces_balances(balance in zero_sum_balances()) {
        let expected: Balance = balance
            .iter()
            .filter(|(_, m)| !m.is_zero())
            .map(|(k, m)| (k.clone(), *m))
            .collect();
        prop_assert_eq!(replay(&balance), expected);
    }

    #[test]
    fn settlement_is_small_positive_and_deterministic(balance in zero_sum_balances()) {
        let transactions = simplify(&balance);
        let non_zero = balance.values().filter(|m| !m.is_zero()).count();
        prop_assert!(transactions.len() <= non_zero.saturating_sub(1));
        prop_assert!(transactions.iter().all(|t| t.amount.is_positive()));
        prop_assert_eq!(transactions, simplify(&balance));
    }
}
