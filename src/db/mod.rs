use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::Config;
use crate::dispatch::NotificationDraft;
use crate::error::Result;
use crate::models::{
    Milestone, MilestoneStatus, NewMilestone, NewProject, NewProposal, Notification, Project,
    ProjectStatus, Proposal, ProposalDecision, ProposalStatus, Role, Transaction, TransactionKind,
    TransactionStatus, User,
};

/// Database connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    // User operations
    pub async fn create_user(&self, name: &str, email: &str, role: Role) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn freelancer_ids(&self) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE role = $1")
            .bind(Role::Freelancer)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    // Project operations
    pub async fn create_project(&self, client_id: i32, project: &NewProject) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (client_id, title, service, budget, deadline, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(&project.title)
        .bind(&project.service)
        .bind(&project.budget)
        .bind(project.deadline)
        .bind(&project.details)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    pub async fn get_project(&self, id: i32) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    pub async fn open_projects(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(ProjectStatus::Open)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    pub async fn projects_for_client(&self, client_id: i32) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    pub async fn projects_assigned_to(&self, freelancer_id: i32) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE assigned_to = $1 ORDER BY updated_at DESC",
        )
        .bind(freelancer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    // Proposal operations
    pub async fn create_proposal(
        &self,
        freelancer_id: i32,
        proposal: &NewProposal,
    ) -> Result<Proposal> {
        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (project_id, freelancer_id, price, cover_letter)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(proposal.project_id)
        .bind(freelancer_id)
        .bind(&proposal.price)
        .bind(&proposal.cover_letter)
        .fetch_one(&self.pool)
        .await?;

        Ok(proposal)
    }

    pub async fn get_proposal(&self, id: i32) -> Result<Option<Proposal>> {
        let proposal = sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(proposal)
    }

    pub async fn proposals_for_project(&self, project_id: i32) -> Result<Vec<Proposal>> {
        let proposals = sqlx::query_as::<_, Proposal>(
            "SELECT * FROM proposals WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(proposals)
    }

    pub async fn count_proposals(&self, project_id: i32) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM proposals WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Decide a pending proposal; on acceptance the project is assigned in
    /// the same transaction. The status flip is conditional on `pending`, so
    /// a decided proposal can never be decided again.
    ///
    /// Returns false when the conditional update matched no row.
    pub async fn decide_proposal(
        &self,
        proposal: &Proposal,
        decision: ProposalDecision,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE proposals SET status = $1 WHERE id = $2 AND status = $3")
            .bind(decision.status())
            .bind(proposal.id)
            .bind(ProposalStatus::Pending)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if decision == ProposalDecision::Accepted {
            sqlx::query(
                "UPDATE projects SET status = $1, assigned_to = $2, updated_at = now() WHERE id = $3",
            )
            .bind(ProjectStatus::InProgress)
            .bind(proposal.freelancer_id)
            .bind(proposal.project_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            proposal_id = proposal.id,
            project_id = proposal.project_id,
            decision = decision.as_str(),
            "proposal decided"
        );

        Ok(true)
    }

    // Milestone operations
    pub async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone> {
        let milestone = sqlx::query_as::<_, Milestone>(
            r#"
            INSERT INTO milestones (project_id, title, amount, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(milestone.project_id)
        .bind(&milestone.title)
        .bind(&milestone.amount)
        .bind(milestone.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(milestone)
    }

    pub async fn get_milestone(&self, id: i32) -> Result<Option<Milestone>> {
        let milestone = sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(milestone)
    }

    pub async fn milestones_for_project(&self, project_id: i32) -> Result<Vec<Milestone>> {
        let milestones = sqlx::query_as::<_, Milestone>(
            "SELECT * FROM milestones WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(milestones)
    }

    /// pending -> funded plus the deposit ledger row, one transaction.
    ///
    /// The transition is a conditional update on the status column: of two
    /// concurrent calls exactly one matches the `pending` row, so exactly one
    /// deposit is ever written. Returns false when the update matched no row.
    pub async fn fund_milestone(&self, milestone: &Milestone, client_id: i32) -> Result<bool> {
        let deposit = milestone.deposit_amount();

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE milestones SET status = $1 WHERE id = $2 AND status = $3")
            .bind(MilestoneStatus::Funded)
            .bind(milestone.id)
            .bind(MilestoneStatus::Pending)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO transactions (amount, kind, status, user_id, milestone_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&deposit)
        .bind(TransactionKind::Deposit)
        .bind(TransactionStatus::Success)
        .bind(client_id)
        .bind(milestone.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(milestone_id = milestone.id, %deposit, "milestone funded");

        Ok(true)
    }

    /// funded -> paid, same conditional-update discipline as funding.
    ///
    /// The payout row is written only when a payee is given; an unassigned
    /// milestone still transitions but pays nobody.
    pub async fn release_milestone(&self, milestone: &Milestone, payee: Option<i32>) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE milestones SET status = $1 WHERE id = $2 AND status = $3")
            .bind(MilestoneStatus::Paid)
            .bind(milestone.id)
            .bind(MilestoneStatus::Funded)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(freelancer_id) = payee {
            sqlx::query(
                r#"
                INSERT INTO transactions (amount, kind, status, user_id, milestone_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&milestone.amount)
            .bind(TransactionKind::Payout)
            .bind(TransactionStatus::Success)
            .bind(freelancer_id)
            .bind(milestone.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(milestone_id = milestone.id, ?payee, "milestone released");

        Ok(true)
    }

    // Transaction operations
    pub async fn transactions_for_user(&self, user_id: i32) -> Result<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn transactions_for_milestone(&self, milestone_id: i32) -> Result<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE milestone_id = $1 ORDER BY created_at ASC",
        )
        .bind(milestone_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    // Notification operations
    pub async fn create_notification(&self, draft: &NotificationDraft) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, content, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(draft.user_id)
        .bind(draft.kind)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.link)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn notifications_for_user(&self, user_id: i32, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_notification_count(&self, user_id: i32) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Recipient-scoped: somebody else's notification id is a no-op.
    pub async fn mark_notification_read(&self, user_id: i32, notification_id: i32) -> Result<()> {
        sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn mark_all_notifications_read(&self, user_id: i32) -> Result<()> {
        sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Initialize the database connection pool and apply migrations
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;
    db.migrate().await?;

    Ok(db)
}
