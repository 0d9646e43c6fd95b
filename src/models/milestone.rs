use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Additive platform fee on escrow deposits: the client is charged
/// amount * 110/100, the freelancer is later paid the plain amount.
const FEE_NUMERATOR: i32 = 110;
const FEE_DENOMINATOR: i32 = 100;

/// Escrow deposit charged for a milestone amount, exact decimal arithmetic.
pub fn deposit_amount(amount: &BigDecimal) -> BigDecimal {
    (amount * BigDecimal::from(FEE_NUMERATOR)) / BigDecimal::from(FEE_DENOMINATOR)
}

/// Payment lifecycle of a milestone. Advances one way only:
/// pending -> funded -> paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "milestone_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    Funded,
    Paid,
}

impl MilestoneStatus {
    /// The only legal successor state, if any.
    pub fn next(self) -> Option<MilestoneStatus> {
        match self {
            MilestoneStatus::Pending => Some(MilestoneStatus::Funded),
            MilestoneStatus::Funded => Some(MilestoneStatus::Paid),
            MilestoneStatus::Paid => None,
        }
    }

    pub fn can_become(self, target: MilestoneStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::Funded => "funded",
            MilestoneStatus::Paid => "paid",
        }
    }
}

/// A priced unit of project work whose payment lifecycle is tracked
/// independently of the project's own status.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Milestone {
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    pub amount: BigDecimal,
    pub status: MilestoneStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Milestone {
    /// What the client deposits when funding this milestone.
    pub fn deposit_amount(&self) -> BigDecimal {
        deposit_amount(&self.amount)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    pub project_id: i32,
    pub title: String,
    pub amount: BigDecimal,
    pub due_date: Option<NaiveDate>,
}

impl NewMilestone {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("milestone title must not be empty".into()));
        }
        if self.amount <= BigDecimal::from(0) {
            return Err(Error::Validation("milestone amount must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_advances_one_way_only() {
        use MilestoneStatus::*;

        assert!(Pending.can_become(Funded));
        assert!(Funded.can_become(Paid));

        // No skipping forward, no moving back, no self loops.
        assert!(!Pending.can_become(Paid));
        assert!(!Funded.can_become(Pending));
        assert!(!Paid.can_become(Pending));
        assert!(!Paid.can_become(Funded));
        assert!(!Pending.can_become(Pending));
        assert_eq!(Paid.next(), None);
    }

    #[test]
    fn deposit_adds_exactly_ten_percent() {
        let cases = [("100", "110"), ("200", "220"), ("19.99", "21.989")];
        for (amount, expected) in cases {
            let amount = BigDecimal::from_str(amount).unwrap();
            let expected = BigDecimal::from_str(expected).unwrap();
            assert_eq!(deposit_amount(&amount), expected);
        }
    }

    #[test]
    fn payout_is_the_plain_amount() {
        // The retained margin is deposit - payout, never a third ledger kind.
        let amount = BigDecimal::from(100);
        let margin = deposit_amount(&amount) - &amount;
        assert_eq!(margin, BigDecimal::from(10));
    }

    #[test]
    fn zero_and_negative_amounts_fail_validation() {
        for bad in ["0", "-5"] {
            let draft = NewMilestone {
                project_id: 1,
                title: "Design".into(),
                amount: BigDecimal::from_str(bad).unwrap(),
                due_date: None,
            };
            assert!(matches!(draft.validate(), Err(Error::Validation(_))));
        }
    }
}
