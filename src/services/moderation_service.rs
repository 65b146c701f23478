//! Staff confirm/disprove actions and the e-mails they trigger.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::notifications::{
    CommentConfirmDisproveNotifier, CommentReplyNotifier, Mailer, NotificationResult, Notifier,
    TutorialAuthorNewConfirmedCommentNotifier, TutorialConfirmDisproveNotifier,
    load_comment_notices, load_tutorial_notices,
};
use crate::config::SiteConfig;
use crate::errors::Result;
use crate::storage::{ConfirmStatus, SeaOrmStorage};

/// Outcome of a bulk moderation action, with the messages shown to staff.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionReport {
    pub updated: usize,
    pub emails: NotificationResult,
    pub messages: Vec<String>,
}

impl ActionReport {
    fn new(status: ConfirmStatus, updated: usize, emails: NotificationResult) -> Self {
        let mut messages = vec![match status {
            ConfirmStatus::Disproved => format!("{} مورد با موفقیت رد شد", updated),
            _ => format!("{} مورد با موفقیت تایید شد", updated),
        }];
        if emails.success > 0 {
            messages.push(format!("{} ایمیل با موفقیت ارسال شد", emails.success));
        }
        if emails.failed > 0 {
            messages.push(format!("ارسال {} ایمیل با خطا مواجه شد", emails.failed));
        }
        Self {
            updated,
            emails,
            messages,
        }
    }
}

pub struct ModerationService {
    storage: Arc<SeaOrmStorage>,
    mailer: Arc<dyn Mailer>,
    site: SiteConfig,
}

impl ModerationService {
    pub fn new(storage: Arc<SeaOrmStorage>, mailer: Arc<dyn Mailer>, site: SiteConfig) -> Self {
        Self {
            storage,
            mailer,
            site,
        }
    }

    async fn set_tutorials(&self, ids: &[i32], status: ConfirmStatus) -> Result<ActionReport> {
        let updated = self.storage.set_tutorials_status(ids, status).await?;
        let notices = load_tutorial_notices(&self.storage, &updated).await?;
        let emails = TutorialConfirmDisproveNotifier::new(self.site.clone())
            .notify(self.mailer.as_ref(), &notices)
            .await;

        info!(
            "Moderation: tutorials {:?} -> {:?}, e-mails {:?}",
            updated, status, emails
        );
        Ok(ActionReport::new(status, updated.len(), emails))
    }

    async fn set_comments(&self, ids: &[i32], status: ConfirmStatus) -> Result<ActionReport> {
        let updated = self.storage.set_comments_status(ids, status).await?;
        let notices = load_comment_notices(&self.storage, &updated).await?;
        let mailer = self.mailer.as_ref();

        let mut emails = CommentConfirmDisproveNotifier::new(self.site.clone())
            .notify(mailer, &notices)
            .await;
        if status == ConfirmStatus::Confirmed {
            emails += CommentReplyNotifier::new(self.site.clone())
                .notify(mailer, &notices)
                .await;
            emails += TutorialAuthorNewConfirmedCommentNotifier::new(self.site.clone())
                .notify(mailer, &notices)
                .await;
        }

        info!(
            "Moderation: comments {:?} -> {:?}, e-mails {:?}",
            updated, status, emails
        );
        Ok(ActionReport::new(status, updated.len(), emails))
    }

    async fn set_exams(&self, ids: &[i32], status: ConfirmStatus) -> Result<ActionReport> {
        let updated = self.storage.set_exams_status(ids, status).await?;
        info!("Moderation: exams {:?} -> {:?}", updated, status);
        Ok(ActionReport::new(
            status,
            updated.len(),
            NotificationResult::default(),
        ))
    }

    pub async fn confirm_tutorials(&self, ids: &[i32]) -> Result<ActionReport> {
        self.set_tutorials(ids, ConfirmStatus::Confirmed).await
    }

    pub async fn disprove_tutorials(&self, ids: &[i32]) -> Result<ActionReport> {
        self.set_tutorials(ids, ConfirmStatus::Disproved).await
    }

    pub async fn confirm_comments(&self, ids: &[i32]) -> Result<ActionReport> {
        self.set_comments(ids, ConfirmStatus::Confirmed).await
    }

    pub async fn disprove_comments(&self, ids: &[i32]) -> Result<ActionReport> {
        self.set_comments(ids, ConfirmStatus::Disproved).await
    }

    pub async fn confirm_exams(&self, ids: &[i32]) -> Result<ActionReport> {
        self.set_exams(ids, ConfirmStatus::Confirmed).await
    }

    pub async fn disprove_exams(&self, ids: &[i32]) -> Result<ActionReport> {
        self.set_exams(ids, ConfirmStatus::Disproved).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_messages() {
        let report = ActionReport::new(
            ConfirmStatus::Confirmed,
            3,
            NotificationResult { success: 2, failed: 1 },
        );
        assert_eq!(
            report.messages,
            vec![
                "3 مورد با موفقیت تایید شد",
                "2 ایمیل با موفقیت ارسال شد",
                "ارسال 1 ایمیل با خطا مواجه شد",
            ]
        );

        let report = ActionReport::new(ConfirmStatus::Disproved, 0, NotificationResult::default());
        assert_eq!(report.messages, vec!["0 مورد با موفقیت رد شد"]);
    }
}
