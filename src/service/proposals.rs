use crate::auth::{Principal, authorize};
use crate::db::Database;
use crate::dispatch::{Dispatcher, NotificationDraft};
use crate::error::{Error, Result};
use crate::models::{NewProposal, ProjectStatus, Proposal, ProposalDecision, Role};

/// Proposal lifecycle: submission by freelancers against open projects and
/// the owner's accept/reject verdict, which assigns the project.
#[derive(Clone)]
pub struct ProposalService {
    db: Database,
    notifier: Dispatcher,
}

impl ProposalService {
    pub fn new(db: Database, notifier: Dispatcher) -> Self {
        Self { db, notifier }
    }

    /// Submit a pending proposal on an open project.
    pub async fn submit(&self, principal: Option<&Principal>, new: NewProposal) -> Result<Proposal> {
        let caller = authorize(principal, Some(Role::Freelancer), None)?;
        new.validate()?;

        let project = self
            .db
            .get_project(new.project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;
        if project.status != ProjectStatus::Open {
            return Err(Error::InvalidState(format!(
                "project {} is not open for proposals",
                project.id
            )));
        }

        let proposal = self.db.create_proposal(caller.id, &new).await?;

        self.notifier.notify(NotificationDraft {
            user_id: project.client_id,
            kind: "proposal_new",
            title: "New Proposal".into(),
            content: format!("You received a new proposal for {}", project.title),
            link: Some(format!("/dashboard/client/requests/{}", project.id)),
        });

        Ok(proposal)
    }

    /// Accept or reject a pending proposal. Only the project owner decides;
    /// acceptance assigns the project to the proposal's freelancer in the
    /// same transaction. A decided proposal cannot be decided again, but a
    /// different pending proposal on the same project still can be — a later
    /// acceptance re-assigns the project. Competing proposals are not
    /// auto-rejected.
    pub async fn decide(
        &self,
        principal: Option<&Principal>,
        proposal_id: i32,
        decision: ProposalDecision,
    ) -> Result<Proposal> {
        let proposal = self
            .db
            .get_proposal(proposal_id)
            .await?
            .ok_or(Error::NotFound("proposal"))?;
        let project = self
            .db
            .get_project(proposal.project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;
        authorize(principal, None, Some(project.client_id))?;

        if !self.db.decide_proposal(&proposal, decision).await? {
            return Err(Error::InvalidState(format!(
                "proposal {proposal_id} has already been decided"
            )));
        }

        self.notifier.notify(NotificationDraft {
            user_id: proposal.freelancer_id,
            kind: decision.notification_kind(),
            title: match decision {
                ProposalDecision::Accepted => "Proposal Accepted".into(),
                ProposalDecision::Rejected => "Proposal Rejected".into(),
            },
            content: format!(
                "Your proposal for {} was {}.",
                project.title,
                decision.as_str()
            ),
            link: Some(
                match decision {
                    ProposalDecision::Accepted => "/dashboard/freelancer/tasks",
                    ProposalDecision::Rejected => "/dashboard/freelancer/jobs",
                }
                .into(),
            ),
        });

        self.db
            .get_proposal(proposal_id)
            .await?
            .ok_or(Error::NotFound("proposal"))
    }

    /// Proposals received on a project, newest first. Owner only: the list
    /// exposes competing bids.
    pub async fn for_project(
        &self,
        principal: Option<&Principal>,
        project_id: i32,
    ) -> Result<Vec<Proposal>> {
        let project = self
            .db
            .get_project(project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;
        authorize(principal, None, Some(project.client_id))?;

        self.db.proposals_for_project(project_id).await
    }

    /// How many proposals a project has received. Public, used on the board.
    pub async fn count(&self, project_id: i32) -> Result<i64> {
        self.db.count_proposals(project_id).await
    }
}
