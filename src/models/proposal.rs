use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    /// A decided proposal is immutable.
    pub fn is_decided(self) -> bool {
        self != ProposalStatus::Pending
    }
}

/// The project owner's verdict on a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalDecision {
    Accepted,
    Rejected,
}

impl ProposalDecision {
    pub fn status(self) -> ProposalStatus {
        match self {
            ProposalDecision::Accepted => ProposalStatus::Accepted,
            ProposalDecision::Rejected => ProposalStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalDecision::Accepted => "accepted",
            ProposalDecision::Rejected => "rejected",
        }
    }

    pub fn notification_kind(self) -> &'static str {
        match self {
            ProposalDecision::Accepted => "proposal_accepted",
            ProposalDecision::Rejected => "proposal_rejected",
        }
    }
}

/// A freelancer's bid on an open project.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Proposal {
    pub id: i32,
    pub project_id: i32,
    pub freelancer_id: i32,
    pub price: BigDecimal,
    pub cover_letter: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProposal {
    pub project_id: i32,
    pub price: BigDecimal,
    pub cover_letter: String,
}

impl NewProposal {
    pub fn validate(&self) -> Result<()> {
        if self.price <= BigDecimal::from(0) {
            return Err(Error::Validation("proposal price must be positive".into()));
        }
        if self.cover_letter.trim().is_empty() {
            return Err(Error::Validation("cover letter must not be empty".into()));
        }
        Ok(())
    }
}
