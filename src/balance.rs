use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::money::Money;
use crate::schemas::{Expense, Group, UserGroupBalance, UserNick};

/// Net position per member: positive means the group owes them money.
pub type Balance = BTreeMap<UserNick, Money>;

/// Folds a group's expenses into one signed balance per member.
///
/// Every declared member starts at zero. Members that only appear in an
/// expense's split (people who have since left) are still counted. Stored
/// expenses with amounts beyond [`Money::max_amount`] are skipped.
pub fn aggregate(members: &BTreeSet<UserNick>, expenses: &[Expense]) -> Balance {
    let mut balance: Balance = members.iter().map(|m| (m.clone(), Money::ZERO)).collect();
    for expense in expenses {
        if !expense.in_range() {
            warn!(
                expense_id = %expense.id,
                "stored expense amount is out of range, skipping"
            );
            continue;
        }
        if !expense.is_balanced() {
            warn!(
                expense_id = %expense.id,
                amount = %expense.amount,
                "stored split amounts do not add up to the expense amount"
            );
        }
        *balance.entry(expense.paid_by.clone()).or_insert(Money::ZERO) += expense.amount;
        for (member, share) in &expense.split_amounts {
            *balance.entry(member.clone()).or_insert(Money::ZERO) -= *share;
        }
    }
    balance
        .into_iter()
        .map(|(member, amount)| (member, Money::round(amount.amount())))
        .collect()
}

pub fn compute_balance_from_group(group: &Group, expenses: &[Expense]) -> Balance {
    let own: Vec<Expense> = expenses
        .iter()
        .filter(|e| e.group_id == group.id)
        .cloned()
        .collect();
    aggregate(&group.members, &own)
}

/// `member`'s balance in each of `groups` they belong to.
pub fn user_balances(member: &str, groups: &[Group], expenses: &[Expense]) -> Vec<UserGroupBalance> {
    groups
        .iter()
        .filter(|g| g.is_member(member))
        .map(|group| {
            let balance = compute_balance_from_group(group, expenses);
            UserGroupBalance {
                group_id: group.id.clone(),
                group_name: group.name.clone(),
                balance: balance.get(member).copied().unwrap_or(Money::ZERO),
            }
        })
        .collect()
}
