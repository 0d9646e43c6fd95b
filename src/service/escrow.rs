use crate::auth::{Principal, authorize};
use crate::db::Database;
use crate::dispatch::{Dispatcher, NotificationDraft};
use crate::error::{Error, Result};
use crate::models::{Milestone, MilestoneStatus, NewMilestone, Role, Transaction};

/// Milestone escrow: funding, release and the append-only ledger behind
/// them. Writes are owner-gated and state transitions are atomic conditional
/// updates; reads are permissive.
#[derive(Clone)]
pub struct EscrowService {
    db: Database,
    notifier: Dispatcher,
}

impl EscrowService {
    pub fn new(db: Database, notifier: Dispatcher) -> Self {
        Self { db, notifier }
    }

    /// Create a milestone in `pending` on a project the caller owns.
    pub async fn create_milestone(
        &self,
        principal: Option<&Principal>,
        new: NewMilestone,
    ) -> Result<Milestone> {
        authorize(principal, Some(Role::Client), None)?;
        new.validate()?;

        let project = self
            .db
            .get_project(new.project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;
        authorize(principal, None, Some(project.client_id))?;

        self.db.create_milestone(&new).await
    }

    /// Simulated escrow deposit: pending -> funded plus a deposit
    /// transaction of amount * 1.10, committed as one unit. The assigned
    /// freelancer, if any, is told the work can start.
    pub async fn fund(&self, principal: Option<&Principal>, milestone_id: i32) -> Result<Milestone> {
        authorize(principal, Some(Role::Client), None)?;

        let milestone = self
            .db
            .get_milestone(milestone_id)
            .await?
            .ok_or(Error::NotFound("milestone"))?;
        let project = self
            .db
            .get_project(milestone.project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;
        authorize(principal, None, Some(project.client_id))?;

        if !self.db.fund_milestone(&milestone, project.client_id).await? {
            return Err(Error::InvalidState(format!(
                "milestone {milestone_id} is not awaiting funding"
            )));
        }

        if let Some(freelancer_id) = project.assigned_to {
            self.notifier.notify(NotificationDraft {
                user_id: freelancer_id,
                kind: "milestone_funded",
                title: "Milestone Funded".into(),
                content: format!(
                    "Funds for \"{}\" have been deposited. You can start working.",
                    milestone.title
                ),
                link: Some("/dashboard/freelancer/tasks".into()),
            });
        }

        self.db
            .get_milestone(milestone_id)
            .await?
            .ok_or(Error::NotFound("milestone"))
    }

    /// Release escrowed funds: funded -> paid. The payout transaction covers
    /// the plain milestone amount (the platform keeps the fee margin) and is
    /// written only when a freelancer is assigned; an unassigned milestone
    /// still transitions but pays nobody.
    pub async fn release(
        &self,
        principal: Option<&Principal>,
        milestone_id: i32,
    ) -> Result<Milestone> {
        authorize(principal, Some(Role::Client), None)?;

        let milestone = self
            .db
            .get_milestone(milestone_id)
            .await?
            .ok_or(Error::NotFound("milestone"))?;
        let project = self
            .db
            .get_project(milestone.project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;
        authorize(principal, None, Some(project.client_id))?;

        if !self
            .db
            .release_milestone(&milestone, project.assigned_to)
            .await?
        {
            return Err(Error::InvalidState(format!(
                "milestone {milestone_id} is not funded"
            )));
        }

        if let Some(freelancer_id) = project.assigned_to {
            self.notifier.notify(NotificationDraft {
                user_id: freelancer_id,
                kind: "milestone_paid",
                title: "Payment Released".into(),
                content: format!(
                    "Payment of ${} for \"{}\" has been released to you.",
                    milestone.amount, milestone.title
                ),
                link: Some("/dashboard/freelancer/financials".into()),
            });
        }

        self.db
            .get_milestone(milestone_id)
            .await?
            .ok_or(Error::NotFound("milestone"))
    }

    /// A "soft ask" from the assigned freelancer: notifies the client that
    /// payment release was requested, with no state mutation. The client may
    /// ignore it.
    pub async fn request_release(
        &self,
        principal: Option<&Principal>,
        milestone_id: i32,
    ) -> Result<()> {
        let caller = authorize(principal, None, None)?;

        let milestone = self
            .db
            .get_milestone(milestone_id)
            .await?
            .ok_or(Error::NotFound("milestone"))?;
        let project = self
            .db
            .get_project(milestone.project_id)
            .await?
            .ok_or(Error::NotFound("project"))?;

        match project.assigned_to {
            Some(assignee) if assignee == caller.id => {}
            _ => return Err(Error::Unauthorized("caller is not assigned to this project")),
        }

        if milestone.status != MilestoneStatus::Funded {
            return Err(Error::InvalidState(format!(
                "milestone {milestone_id} is not funded"
            )));
        }

        self.notifier.notify(NotificationDraft {
            user_id: project.client_id,
            kind: "milestone_request",
            title: "Release Requested".into(),
            content: format!(
                "Freelancer requested payment release for \"{}\".",
                milestone.title
            ),
            link: Some(format!("/dashboard/client/requests/{}", project.id)),
        });

        Ok(())
    }

    /// Milestones of a project, creation order. Anonymous callers get an
    /// empty list rather than an error.
    pub async fn milestones_for_project(
        &self,
        principal: Option<&Principal>,
        project_id: i32,
    ) -> Result<Vec<Milestone>> {
        if principal.is_none() {
            return Ok(Vec::new());
        }

        self.db.milestones_for_project(project_id).await
    }

    /// The caller's own ledger entries, newest first.
    pub async fn ledger_for_user(&self, principal: Option<&Principal>) -> Result<Vec<Transaction>> {
        let caller = authorize(principal, None, None)?;

        self.db.transactions_for_user(caller.id).await
    }
}
