//! Turning an expense total into per-member owed amounts.

use crate::money::Money;
use crate::schemas::UserNick;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub type SplitDetails = BTreeMap<UserNick, Decimal>;
pub type SplitAmounts = BTreeMap<UserNick, Money>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("Invalid split type: {0}")]
    InvalidPolicy(String),

    #[error("Invalid split details: {0}")]
    ValidationFailed(String),

    #[error("Split details must name at least one member")]
    EmptyDetails,

    #[error("Expense amount must be positive")]
    NonPositiveTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    Equal,
    Percentage,
    Fixed,
}

impl SplitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitPolicy::Equal => "equal",
            SplitPolicy::Percentage => "percentage",
            SplitPolicy::Fixed => "fixed",
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitPolicy {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(SplitPolicy::Equal),
            "percentage" => Ok(SplitPolicy::Percentage),
            "fixed" => Ok(SplitPolicy::Fixed),
            other => Err(SplitError::InvalidPolicy(other.to_string())),
        }
    }
}

/// Checks the split details against the policy's invariant.
///
/// - `equal`: every supplied value must be identical. The values carry no
///   meaning for the amounts, this only mirrors the placeholder check the
///   clients have always been held to.
/// - `percentage`: values are non-negative and sum to exactly 100.
/// - `fixed`: values are non-negative and sum to exactly `total`.
///
/// The total and every value must stay within [`Money::max_amount`].
pub fn validate(total: Money, policy: SplitPolicy, details: &SplitDetails) -> bool {
    check(total, policy, details).is_ok()
}

fn out_of_range() -> SplitError {
    SplitError::ValidationFailed("amount out of range".to_string())
}

fn checked_sum(details: &SplitDetails) -> Result<Decimal, SplitError> {
    details
        .values()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(out_of_range)
}

fn check(total: Money, policy: SplitPolicy, details: &SplitDetails) -> Result<(), SplitError> {
    if !total.is_positive() {
        return Err(SplitError::NonPositiveTotal);
    }
    if details.is_empty() {
        return Err(SplitError::EmptyDetails);
    }
    let limit = Money::max_amount();
    if total.amount() > limit || details.values().any(|v| v.abs() > limit) {
        return Err(out_of_range());
    }
    if policy != SplitPolicy::Equal && details.values().any(|v| *v < Decimal::ZERO) {
        return Err(SplitError::ValidationFailed(
            "split values must not be negative".to_string(),
        ));
    }

    match policy {
        SplitPolicy::Equal => {
            let distinct: BTreeSet<&Decimal> = details.values().collect();
            if distinct.len() != 1 {
                return Err(SplitError::ValidationFailed(
                    "equal split values must all match".to_string(),
                ));
            }
        }
        SplitPolicy::Percentage => {
            let sum = checked_sum(details)?;
            if sum != Decimal::ONE_HUNDRED {
                return Err(SplitError::ValidationFailed(format!(
                    "percentages sum to {sum}, expected 100"
                )));
            }
        }
        SplitPolicy::Fixed => {
            let sum = checked_sum(details)?;
            if sum != total.amount() {
                return Err(SplitError::ValidationFailed(format!(
                    "fixed amounts sum to {sum}, expected {total}"
                )));
            }
        }
    }
    Ok(())
}

/// Computes each member's share of `total`.
///
/// Shares are truncated to the cent, then the leftover cents are handed out
/// one at a time in key order, so the shares always sum to `total`. Members
/// with a zero percentage or a zero fixed amount never receive a leftover
/// cent, and for valid details no share is ever negative.
pub fn compute(
    total: Money,
    policy: SplitPolicy,
    details: &SplitDetails,
) -> Result<SplitAmounts, SplitError> {
    if details.is_empty() {
        return Err(SplitError::EmptyDetails);
    }

    let count = Decimal::from(details.len());
    let mut amounts = SplitAmounts::new();
    let mut eligible: Vec<&UserNick> = Vec::new();
    for (member, value) in details {
        let raw = match policy {
            SplitPolicy::Equal => total.amount().checked_div(count),
            SplitPolicy::Percentage => total
                .amount()
                .checked_mul(*value)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
            SplitPolicy::Fixed => Some(*value),
        }
        .ok_or_else(out_of_range)?;
        if policy == SplitPolicy::Equal || !value.is_zero() {
            eligible.push(member);
        }
        amounts.insert(member.clone(), Money::truncate(raw));
    }
    if eligible.is_empty() {
        eligible = details.keys().collect();
    }

    let allocated = amounts
        .values()
        .try_fold(Money::ZERO, |acc, m| acc.checked_add(*m))
        .ok_or_else(out_of_range)?;
    let leftover = total
        .checked_sub(allocated)
        .and_then(|m| m.cents())
        .ok_or_else(out_of_range)?;

    if leftover != 0 {
        debug!(%policy, leftover_cents = leftover, "handing out leftover cents");
        let n = eligible.len() as i64;
        let (each, extra) = (leftover / n, leftover % n);
        for (i, member) in eligible.into_iter().enumerate() {
            let mut cents = each;
            if (i as i64) < extra.abs() {
                cents += extra.signum();
            }
            if cents == 0 {
                continue;
            }
            if let Some(share) = amounts.get_mut(member) {
                *share = share
                    .checked_add(Money::from_cents(cents))
                    .ok_or_else(out_of_range)?;
            }
        }
    }
    Ok(amounts)
}

/// Validates and then computes a split. `compute` is never reached when
/// validation fails.
pub fn split_amounts(
    total: Money,
    policy: SplitPolicy,
    details: &SplitDetails,
) -> Result<SplitAmounts, SplitError> {
    check(total, policy, details)?;
    compute(total, policy, details)
}
