use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::split::{self, SplitAmounts, SplitDetails, SplitPolicy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type UserNick = String;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub username: UserNick,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    pub username: UserNick,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegisterUser {
    pub username: UserNick,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginForm {
    pub username: UserNick,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub members: BTreeSet<UserNick>,
}

impl Group {
    /// A fresh group whose only member is its creator.
    pub fn new(name: String, creator: UserNick) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(LedgerError::Validation("group name must not be empty".to_string()));
        }
        Ok(Group {
            id: new_id(),
            name,
            members: BTreeSet::from([creator]),
        })
    }

    pub fn is_member(&self, member: &str) -> bool {
        self.members.contains(member)
    }
}

#[derive(Deserialize, Serialize)]
pub struct GroupNameJson {
    pub name: String,
}

/// The caller-supplied part of an expense, shared by create and update.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Decimal,
    pub paid_by: UserNick,
    pub split_type: String,
    #[serde(default)]
    pub split_details: SplitDetails,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewExpense {
    pub group_id: String,
    #[serde(flatten)]
    pub expense: ExpenseDraft,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount: Money,
    pub paid_by: UserNick,
    pub split_type: SplitPolicy,
    pub split_details: SplitDetails,
    pub split_amounts: SplitAmounts,
}

impl Expense {
    /// Builds an expense for `group`, computing the split amounts.
    ///
    /// The payer and every member named in the split must belong to the
    /// group right now. Later membership changes do not invalidate it.
    pub fn new(id: String, group: &Group, draft: ExpenseDraft) -> Result<Self> {
        if draft.description.trim().is_empty() {
            return Err(LedgerError::Validation("description must not be empty".to_string()));
        }
        if !group.is_member(&draft.paid_by) {
            return Err(LedgerError::Validation(format!(
                "{} is not a member of the group",
                draft.paid_by
            )));
        }
        if let Some(outsider) = draft.split_details.keys().find(|m| !group.is_member(m)) {
            return Err(LedgerError::Validation(format!(
                "{outsider} is not a member of the group"
            )));
        }

        let policy: SplitPolicy = draft.split_type.parse()?;
        let amount = Money::round(draft.amount);
        let split_amounts = split::split_amounts(amount, policy, &draft.split_details)?;

        let expense = Expense {
            id,
            group_id: group.id.clone(),
            description: draft.description,
            amount,
            paid_by: draft.paid_by,
            split_type: policy,
            split_details: draft.split_details,
            split_amounts,
        };
        if !expense.is_balanced() {
            return Err(LedgerError::Internal(format!(
                "split of expense {} does not add up",
                expense.id
            )));
        }
        Ok(expense)
    }

    /// Whether the split amounts add up to the expense amount.
    pub fn is_balanced(&self) -> bool {
        self.split_amounts.values().sum::<Money>() == self.amount
    }

    /// Whether the amount and every share are within [`Money::max_amount`].
    pub fn in_range(&self) -> bool {
        let limit = Money::max_amount();
        self.amount.amount().abs() <= limit
            && self.split_amounts.values().all(|m| m.amount().abs() <= limit)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserGroupBalance {
    pub group_id: String,
    pub group_name: String,
    pub balance: Money,
}
