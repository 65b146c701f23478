use super::{CommentNotice, EmailMessage, Notifier, email_of};
use crate::config::SiteConfig;
use crate::storage::ConfirmStatus;
use migration::entities::{tutorial, tutorial_comment};

fn is_confirmed(status: i32) -> bool {
    status == ConfirmStatus::Confirmed.as_i32()
}

fn comment_url(site: &SiteConfig, tutorial: &tutorial::Model, comment: &tutorial_comment::Model) -> String {
    site.absolute_url(&format!("/tutorial/{}#comment-{}", tutorial.slug, comment.id))
}

/// Tells a commenter their comment was confirmed or disproved.
pub struct CommentConfirmDisproveNotifier {
    site: SiteConfig,
}

impl CommentConfirmDisproveNotifier {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Notifier for CommentConfirmDisproveNotifier {
    type Item = CommentNotice;

    fn accepts(&self, item: &CommentNotice) -> bool {
        item.tutorial.is_some()
            && email_of(item.author.as_ref()).is_some()
            && item.comment.confirm_status != ConfirmStatus::Waiting.as_i32()
    }

    fn compose(&self, item: &CommentNotice) -> Option<EmailMessage> {
        let to = email_of(item.author.as_ref())?;
        let tutorial = item.tutorial.as_ref()?;
        let confirmed = is_confirmed(item.comment.confirm_status);
        let mut body = format!(
            "دیدگاه \"{}\" برای آموزش {} {}",
            item.comment.title,
            tutorial.title,
            if confirmed { "تایید شد" } else { "رد شد" }
        );
        if confirmed {
            body.push_str(&format!(
                "\n لینک پاسخ: {}",
                comment_url(&self.site, tutorial, &item.comment)
            ));
        }
        Some(EmailMessage {
            to,
            subject: "تایید/رد دیدگاه".to_string(),
            body,
        })
    }
}

/// Tells a tutorial's author about a newly confirmed comment.
pub struct TutorialAuthorNewConfirmedCommentNotifier {
    site: SiteConfig,
}

impl TutorialAuthorNewConfirmedCommentNotifier {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Notifier for TutorialAuthorNewConfirmedCommentNotifier {
    type Item = CommentNotice;

    fn accepts(&self, item: &CommentNotice) -> bool {
        let Some(tutorial) = item.tutorial.as_ref() else {
            return false;
        };
        is_confirmed(item.comment.confirm_status)
            && item.comment.is_active
            && is_confirmed(tutorial.confirm_status)
            && tutorial.is_active
            && email_of(item.tutorial_author.as_ref()).is_some()
    }

    fn compose(&self, item: &CommentNotice) -> Option<EmailMessage> {
        let to = email_of(item.tutorial_author.as_ref())?;
        let tutorial = item.tutorial.as_ref()?;
        let body = format!(
            "دیدگاه \"{}\" برای آموزش \"{}\" ثبت و تایید شد \nلینک دیدگاه: {}",
            item.comment.title,
            tutorial.title,
            comment_url(&self.site, tutorial, &item.comment)
        );
        Some(EmailMessage {
            to,
            subject: "ثبت دیدگاه جدید برای آموزش شما".to_string(),
            body,
        })
    }
}

/// Tells the parent comment's author that a reply was confirmed.
pub struct CommentReplyNotifier {
    site: SiteConfig,
}

impl CommentReplyNotifier {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Notifier for CommentReplyNotifier {
    type Item = CommentNotice;

    fn accepts(&self, item: &CommentNotice) -> bool {
        let Some(parent) = item.parent.as_ref() else {
            return false;
        };
        item.tutorial.is_some()
            && is_confirmed(parent.confirm_status)
            && parent.is_active
            && parent.notify_replies
            && email_of(item.parent_author.as_ref()).is_some()
    }

    fn compose(&self, item: &CommentNotice) -> Option<EmailMessage> {
        let to = email_of(item.parent_author.as_ref())?;
        let parent = item.parent.as_ref()?;
        let tutorial = item.tutorial.as_ref()?;
        let body = format!(
            "پاسخی برای نظر \"{}\" ثبت شده و اکنون تایید شد\nلینک پاسخ: {}",
            parent.title,
            comment_url(&self.site, tutorial, &item.comment)
        );
        Some(EmailMessage {
            to,
            subject: format!("پاسخ به نظر \"{}\"", parent.title),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::super::fixtures::user_with_email;
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://majazamooz.ir".into(),
            utc_offset_minutes: 0,
        }
    }

    fn comment(id: i32, status: ConfirmStatus, parent: Option<i32>) -> tutorial_comment::Model {
        let now = Utc::now();
        tutorial_comment::Model {
            id,
            title: format!("دیدگاه {}", id),
            body: "متن".into(),
            likes_count: 0,
            up_votes_count: 0,
            down_votes_count: 0,
            create_date: now,
            last_edit_date: now,
            confirm_status: status.as_i32(),
            allow_reply: true,
            notify_replies: true,
            is_active: true,
            user_id: Some(2),
            tutorial_id: 1,
            parent_comment_id: parent,
        }
    }

    fn tutorial(status: ConfirmStatus) -> tutorial::Model {
        let now = Utc::now();
        tutorial::Model {
            id: 1,
            title: "آموزش".into(),
            slug: "learn".into(),
            short_description: String::new(),
            body: String::new(),
            image: None,
            total_views_count: 0,
            user_views_count: 0,
            up_votes_count: 0,
            down_votes_count: 0,
            likes_count: 0,
            create_date: now,
            last_edit_date: now,
            confirm_status: status.as_i32(),
            is_edited: false,
            is_active: true,
            author_id: Some(1),
        }
    }

    fn notice(status: ConfirmStatus) -> CommentNotice {
        CommentNotice {
            comment: comment(10, status, None),
            author: Some(user_with_email(2, "commenter@example.com")),
            tutorial: Some(tutorial(ConfirmStatus::Confirmed)),
            tutorial_author: Some(user_with_email(1, "author@example.com")),
            parent: None,
            parent_author: None,
        }
    }

    #[test]
    fn confirm_disprove_skips_waiting_and_orphans() {
        let mut orphan = notice(ConfirmStatus::Confirmed);
        orphan.tutorial = None;
        let mut anonymous = notice(ConfirmStatus::Confirmed);
        anonymous.author = None;
        let items = vec![
            notice(ConfirmStatus::Waiting),
            orphan,
            anonymous,
            notice(ConfirmStatus::Disproved),
        ];
        let notifier = CommentConfirmDisproveNotifier::new(site());
        let selected = notifier.select(&items);
        assert_eq!(selected.len(), 1);

        let message = notifier.compose(selected[0]).unwrap();
        assert_eq!(message.to, "commenter@example.com");
        assert!(message.body.ends_with("رد شد"));
    }

    #[test]
    fn confirmed_comment_links_its_anchor() {
        let notifier = CommentConfirmDisproveNotifier::new(site());
        let message = notifier.compose(&notice(ConfirmStatus::Confirmed)).unwrap();
        assert!(message.body.contains("https://majazamooz.ir/tutorial/learn#comment-10"));
    }

    #[test]
    fn tutorial_author_needs_confirmed_tutorial() {
        let notifier = TutorialAuthorNewConfirmedCommentNotifier::new(site());
        assert!(notifier.accepts(&notice(ConfirmStatus::Confirmed)));
        assert!(!notifier.accepts(&notice(ConfirmStatus::Disproved)));

        let mut hidden = notice(ConfirmStatus::Confirmed);
        hidden.tutorial = Some(tutorial(ConfirmStatus::Waiting));
        assert!(!notifier.accepts(&hidden));

        let message = notifier.compose(&notice(ConfirmStatus::Confirmed)).unwrap();
        assert_eq!(message.to, "author@example.com");
        assert_eq!(message.subject, "ثبت دیدگاه جدید برای آموزش شما");
    }

    #[test]
    fn reply_goes_to_parent_author() {
        let notifier = CommentReplyNotifier::new(site());
        assert!(!notifier.accepts(&notice(ConfirmStatus::Confirmed)));

        let mut reply = notice(ConfirmStatus::Confirmed);
        reply.comment = comment(11, ConfirmStatus::Confirmed, Some(10));
        reply.parent = Some(comment(10, ConfirmStatus::Confirmed, None));
        reply.parent_author = Some(user_with_email(3, "parent@example.com"));
        assert!(notifier.accepts(&reply));

        let message = notifier.compose(&reply).unwrap();
        assert_eq!(message.to, "parent@example.com");
        assert_eq!(message.subject, "پاسخ به نظر \"دیدگاه 10\"");

        reply.parent.as_mut().unwrap().notify_replies = false;
        assert!(!notifier.accepts(&reply));
    }
}
