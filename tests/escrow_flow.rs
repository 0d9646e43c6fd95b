//! End-to-end escrow flows against a real Postgres.
//!
//! These tests need `DATABASE_URL` pointing at a database the suite may
//! write to (migrations are applied on connect), so they are `#[ignore]`d
//! by default. Run them with:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/escrow_test cargo test -- --ignored
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use bigdecimal::BigDecimal;
use tokio::task::JoinHandle;

use escrow_manager::models::{
    MilestoneStatus, NewMilestone, NewProject, NewProposal, ProposalDecision, ProposalStatus,
    Role, TransactionKind,
};
use escrow_manager::{
    Config, Database, Dispatcher, Error, EscrowService, NotificationService, Principal,
    ProjectService, ProposalService, db,
};

struct Harness {
    db: Database,
    notifier: Dispatcher,
    writer: JoinHandle<()>,
    projects: ProjectService,
    proposals: ProposalService,
    escrow: EscrowService,
    notifications: NotificationService,
    client: Principal,
    freelancer: Principal,
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

impl Harness {
    async fn new() -> Result<Self> {
        let config = Config::load()?;
        let db = db::init(&config).await?;
        let (notifier, writer) = Dispatcher::spawn(db.clone(), 1024);

        let suffix = unique_suffix();
        let client_row = db
            .create_user("Client", &format!("client+{suffix}@example.com"), Role::Client)
            .await?;
        let freelancer_row = db
            .create_user(
                "Freelancer",
                &format!("freelancer+{suffix}@example.com"),
                Role::Freelancer,
            )
            .await?;

        Ok(Self {
            projects: ProjectService::new(db.clone(), notifier.clone()),
            proposals: ProposalService::new(db.clone(), notifier.clone()),
            escrow: EscrowService::new(db.clone(), notifier.clone()),
            notifications: NotificationService::new(db.clone()),
            client: Principal { id: client_row.id, role: Role::Client },
            freelancer: Principal { id: freelancer_row.id, role: Role::Freelancer },
            db,
            notifier,
            writer,
        })
    }

    /// Post a project and run it through proposal acceptance so it is
    /// assigned to the harness freelancer.
    async fn assigned_project(&self) -> Result<i32> {
        let project_id = self.open_project().await?;

        let proposal = self
            .proposals
            .submit(
                Some(&self.freelancer),
                NewProposal {
                    project_id,
                    price: BigDecimal::from(500),
                    cover_letter: "I can do this.".into(),
                },
            )
            .await?;
        self.proposals
            .decide(Some(&self.client), proposal.id, ProposalDecision::Accepted)
            .await?;

        Ok(project_id)
    }

    async fn open_project(&self) -> Result<i32> {
        let project = self
            .projects
            .create(
                Some(&self.client),
                NewProject {
                    title: "Marketing site".into(),
                    service: "web".into(),
                    budget: BigDecimal::from(1000),
                    deadline: None,
                    details: None,
                },
            )
            .await?;

        Ok(project.id)
    }

    async fn milestone(&self, project_id: i32, title: &str, amount: i32) -> Result<i32> {
        let milestone = self
            .escrow
            .create_milestone(
                Some(&self.client),
                NewMilestone {
                    project_id,
                    title: title.into(),
                    amount: BigDecimal::from(amount),
                    due_date: None,
                },
            )
            .await?;

        Ok(milestone.id)
    }

    /// Close the dispatch queue and wait for the writer to drain it, so
    /// notification rows are visible to assertions.
    async fn flush(self) -> Result<Database> {
        let Harness { db, notifier, writer, projects, proposals, escrow, notifications, .. } = self;
        drop((projects, proposals, escrow, notifications, notifier));
        writer.await?;
        Ok(db)
    }
}

#[tokio::test]
#[ignore]
async fn funding_writes_exactly_one_deposit_with_the_fee() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 100).await?;

    let funded = h.escrow.fund(Some(&h.client), milestone_id).await?;
    assert_eq!(funded.status, MilestoneStatus::Funded);

    let ledger = h.db.transactions_for_milestone(milestone_id).await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, TransactionKind::Deposit);
    assert_eq!(ledger[0].amount, BigDecimal::from(110));
    assert_eq!(ledger[0].user_id, h.client.id);

    Ok(())
}

#[tokio::test]
#[ignore]
async fn concurrent_funding_has_exactly_one_winner() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 100).await?;

    let (first, second) = tokio::join!(
        h.escrow.fund(Some(&h.client), milestone_id),
        h.escrow.fund(Some(&h.client), milestone_id),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(Error::InvalidState(_))))
    );

    let ledger = h.db.transactions_for_milestone(milestone_id).await?;
    assert_eq!(ledger.len(), 1, "exactly one deposit for the race winner");

    Ok(())
}

#[tokio::test]
#[ignore]
async fn releasing_a_pending_milestone_fails_and_writes_nothing() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 100).await?;

    let result = h.escrow.release(Some(&h.client), milestone_id).await;
    assert!(matches!(result, Err(Error::InvalidState(_))));

    assert!(h.db.transactions_for_milestone(milestone_id).await?.is_empty());
    let milestone = h.db.get_milestone(milestone_id).await?.unwrap();
    assert_eq!(milestone.status, MilestoneStatus::Pending);

    Ok(())
}

#[tokio::test]
#[ignore]
async fn release_without_assignee_transitions_but_pays_nobody() -> Result<()> {
    let h = Harness::new().await?;
    // No proposal ever accepted: the project stays unassigned.
    let project_id = h.open_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 100).await?;

    h.escrow.fund(Some(&h.client), milestone_id).await?;
    let released = h.escrow.release(Some(&h.client), milestone_id).await?;
    assert_eq!(released.status, MilestoneStatus::Paid);

    // The deposit stays on the ledger with no payout row: the funds rest
    // with the platform.
    let ledger = h.db.transactions_for_milestone(milestone_id).await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, TransactionKind::Deposit);

    Ok(())
}

#[tokio::test]
#[ignore]
async fn design_milestone_scenario_end_to_end() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 200).await?;

    h.escrow.fund(Some(&h.client), milestone_id).await?;
    h.escrow.release(Some(&h.client), milestone_id).await?;

    let ledger = h.db.transactions_for_milestone(milestone_id).await?;
    let deposit = ledger.iter().find(|t| t.kind == TransactionKind::Deposit).unwrap();
    let payout = ledger.iter().find(|t| t.kind == TransactionKind::Payout).unwrap();
    assert_eq!(deposit.amount, BigDecimal::from(220));
    assert_eq!(payout.amount, BigDecimal::from(200));
    assert_eq!(payout.user_id, h.freelancer.id);

    let freelancer = h.freelancer;
    let notifications = h.notifications.clone();
    let db = h.flush().await?;
    drop(db);

    let received = notifications.list_for(Some(&freelancer)).await?;
    assert!(received.iter().any(|n| n.kind == "milestone_paid"));

    Ok(())
}

#[tokio::test]
#[ignore]
async fn a_second_acceptance_on_another_proposal_reassigns_the_project() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;

    let suffix = unique_suffix();
    let other_row = h
        .db
        .create_user("Other", &format!("other+{suffix}@example.com"), Role::Freelancer)
        .await?;
    let other = Principal { id: other_row.id, role: Role::Freelancer };

    // The project is no longer open, so a fresh submission is refused...
    let refused = h
        .proposals
        .submit(
            Some(&other),
            NewProposal {
                project_id,
                price: BigDecimal::from(400),
                cover_letter: "Cheaper.".into(),
            },
        )
        .await;
    assert!(matches!(refused, Err(Error::InvalidState(_))));

    // ...but a competing proposal submitted while it was open is still
    // decidable, and acceptance re-assigns the project.
    let competing = h.db.create_proposal(
        other.id,
        &NewProposal {
            project_id,
            price: BigDecimal::from(400),
            cover_letter: "Cheaper.".into(),
        },
    )
    .await?;
    let decided = h
        .proposals
        .decide(Some(&h.client), competing.id, ProposalDecision::Accepted)
        .await?;
    assert_eq!(decided.status, ProposalStatus::Accepted);

    let project = h.db.get_project(project_id).await?.unwrap();
    assert_eq!(project.assigned_to, Some(other.id));

    // The first acceptance stays irrevocable.
    let first = h.db.proposals_for_project(project_id).await?;
    assert!(first.iter().any(|p| p.freelancer_id == h.freelancer.id
        && p.status == ProposalStatus::Accepted));

    Ok(())
}

#[tokio::test]
#[ignore]
async fn release_request_from_a_stranger_is_unauthorized_and_silent() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 100).await?;
    h.escrow.fund(Some(&h.client), milestone_id).await?;

    let suffix = unique_suffix();
    let stranger_row = h
        .db
        .create_user(
            "Stranger",
            &format!("stranger+{suffix}@example.com"),
            Role::Freelancer,
        )
        .await?;
    let stranger = Principal { id: stranger_row.id, role: Role::Freelancer };

    let result = h.escrow.request_release(Some(&stranger), milestone_id).await;
    assert!(matches!(result, Err(Error::Unauthorized(_))));

    let client = h.client;
    let notifications = h.notifications.clone();
    h.flush().await?;

    let received = notifications.list_for(Some(&client)).await?;
    assert!(received.iter().all(|n| n.kind != "milestone_request"));

    Ok(())
}

#[tokio::test]
#[ignore]
async fn assigned_freelancer_can_ask_for_release_of_a_funded_milestone() -> Result<()> {
    let h = Harness::new().await?;
    let project_id = h.assigned_project().await?;
    let milestone_id = h.milestone(project_id, "Design", 100).await?;

    // Not funded yet: the soft ask is refused and nothing changes.
    let early = h.escrow.request_release(Some(&h.freelancer), milestone_id).await;
    assert!(matches!(early, Err(Error::InvalidState(_))));

    h.escrow.fund(Some(&h.client), milestone_id).await?;
    h.escrow.request_release(Some(&h.freelancer), milestone_id).await?;

    // Pure notification: the milestone state is unaffected.
    let milestone = h.db.get_milestone(milestone_id).await?.unwrap();
    assert_eq!(milestone.status, MilestoneStatus::Funded);

    let client = h.client;
    let notifications = h.notifications.clone();
    h.flush().await?;

    let received = notifications.list_for(Some(&client)).await?;
    assert!(received.iter().any(|n| n.kind == "milestone_request"));

    Ok(())
}
