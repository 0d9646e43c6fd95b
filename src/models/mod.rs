mod milestone;
mod notification;
mod project;
mod proposal;
mod transaction;
mod user;

pub use milestone::{Milestone, MilestoneStatus, NewMilestone, deposit_amount};
pub use notification::Notification;
pub use project::{NewProject, Project, ProjectStatus};
pub use proposal::{NewProposal, Proposal, ProposalDecision, ProposalStatus};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
pub use user::{Role, User};
