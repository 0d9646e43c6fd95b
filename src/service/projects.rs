use tracing::info;

use crate::auth::{Principal, authorize};
use crate::db::Database;
use crate::dispatch::{Dispatcher, NotificationDraft};
use crate::error::Result;
use crate::models::{NewProject, Project, Role};

/// Project intake and the read paths around it.
#[derive(Clone)]
pub struct ProjectService {
    db: Database,
    notifier: Dispatcher,
}

impl ProjectService {
    pub fn new(db: Database, notifier: Dispatcher) -> Self {
        Self { db, notifier }
    }

    /// Post a new open project and announce it to every freelancer.
    pub async fn create(&self, principal: Option<&Principal>, new: NewProject) -> Result<Project> {
        let caller = authorize(principal, Some(Role::Client), None)?;
        new.validate()?;

        let project = self.db.create_project(caller.id, &new).await?;

        // One draft per freelancer. Heavy with a large user base; the
        // bounded dispatch queue sheds the overflow.
        for freelancer_id in self.db.freelancer_ids().await? {
            self.notifier.notify(NotificationDraft {
                user_id: freelancer_id,
                kind: "project_new",
                title: "New Project Available".into(),
                content: format!("New project posted: {} ({})", project.title, project.budget),
                link: Some("/dashboard/freelancer/jobs".into()),
            });
        }

        info!(project_id = project.id, "project created");

        Ok(project)
    }

    /// The public board of open projects, newest first.
    pub async fn open_projects(&self) -> Result<Vec<Project>> {
        self.db.open_projects().await
    }

    /// The caller's own postings. Anonymous callers get an empty list.
    pub async fn projects_for_client(&self, principal: Option<&Principal>) -> Result<Vec<Project>> {
        match principal {
            Some(caller) => self.db.projects_for_client(caller.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Projects assigned to the calling freelancer, most recently touched
    /// first. Anonymous callers get an empty list.
    pub async fn tasks_for_freelancer(&self, principal: Option<&Principal>) -> Result<Vec<Project>> {
        match principal {
            Some(caller) => self.db.projects_assigned_to(caller.id).await,
            None => Ok(Vec::new()),
        }
    }
}
