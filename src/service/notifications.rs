use crate::auth::Principal;
use crate::db::Database;
use crate::error::Result;
use crate::models::Notification;

/// Most notifications a recipient sees at once.
const LIST_LIMIT: i64 = 20;

/// Recipient-facing notification reads. All paths are permissive: an
/// anonymous caller gets empty results and no-ops, never an error.
#[derive(Clone)]
pub struct NotificationService {
    db: Database,
}

impl NotificationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The caller's latest notifications, newest first.
    pub async fn list_for(&self, principal: Option<&Principal>) -> Result<Vec<Notification>> {
        match principal {
            Some(caller) => self.db.notifications_for_user(caller.id, LIST_LIMIT).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn unread_count(&self, principal: Option<&Principal>) -> Result<i64> {
        match principal {
            Some(caller) => self.db.unread_notification_count(caller.id).await,
            None => Ok(0),
        }
    }

    /// Mark one of the caller's notifications read. Scoped to the caller:
    /// somebody else's notification id is a no-op.
    pub async fn mark_read(
        &self,
        principal: Option<&Principal>,
        notification_id: i32,
    ) -> Result<()> {
        match principal {
            Some(caller) => self.db.mark_notification_read(caller.id, notification_id).await,
            None => Ok(()),
        }
    }

    pub async fn mark_all_read(&self, principal: Option<&Principal>) -> Result<()> {
        match principal {
            Some(caller) => self.db.mark_all_notifications_read(caller.id).await,
            None => Ok(()),
        }
    }
}
