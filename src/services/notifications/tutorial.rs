use super::{EmailMessage, Notifier, TutorialNotice, email_of};
use crate::config::SiteConfig;
use crate::storage::ConfirmStatus;

/// Tells authors their tutorial was confirmed or disproved.
pub struct TutorialConfirmDisproveNotifier {
    site: SiteConfig,
}

impl TutorialConfirmDisproveNotifier {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Notifier for TutorialConfirmDisproveNotifier {
    type Item = TutorialNotice;

    fn accepts(&self, item: &TutorialNotice) -> bool {
        let decided = !matches!(
            ConfirmStatus::from_i32(item.tutorial.confirm_status),
            Some(ConfirmStatus::Waiting) | None
        );
        decided && email_of(item.author.as_ref()).is_some()
    }

    fn compose(&self, item: &TutorialNotice) -> Option<EmailMessage> {
        let to = email_of(item.author.as_ref())?;
        let confirmed = item.tutorial.confirm_status == ConfirmStatus::Confirmed.as_i32();
        let mut body = format!(
            "آموزش \"{}\" {}",
            item.tutorial.title,
            if confirmed { "تایید شد" } else { "رد شد" }
        );
        if confirmed {
            let url = self
                .site
                .absolute_url(&format!("/tutorial/{}", item.tutorial.slug));
            body.push_str(&format!("\n لینک آموزش: {}", url));
        }
        Some(EmailMessage {
            to,
            subject: "تایید/رد آموزش".to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use migration::entities::tutorial;

    use super::super::fixtures::user_with_email;
    use super::*;

    fn notice(status: ConfirmStatus, email: &str) -> TutorialNotice {
        let now = Utc::now();
        TutorialNotice {
            tutorial: tutorial::Model {
                id: 1,
                title: "آموزش راست".into(),
                slug: "rust".into(),
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
                author_id: Some(7),
            },
            author: Some(user_with_email(7, email)),
        }
    }

    fn notifier() -> TutorialConfirmDisproveNotifier {
        TutorialConfirmDisproveNotifier::new(SiteConfig {
            base_url: "https://majazamooz.ir".into(),
            utc_offset_minutes: 0,
        })
    }

    #[test]
    fn skips_waiting_and_missing_email() {
        let items = vec![
            notice(ConfirmStatus::Waiting, "a@example.com"),
            notice(ConfirmStatus::Confirmed, ""),
            notice(ConfirmStatus::Disproved, "b@example.com"),
        ];
        let selected = notifier().select(&items);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].author.as_ref().unwrap().email, "b@example.com");
    }

    #[test]
    fn confirmed_mail_links_the_tutorial() {
        let message = notifier()
            .compose(&notice(ConfirmStatus::Confirmed, "a@example.com"))
            .unwrap();
        assert_eq!(message.subject, "تایید/رد آموزش");
        assert!(message.body.contains("تایید شد"));
        assert!(message.body.contains("https://majazamooz.ir/tutorial/rust"));

        let message = notifier()
            .compose(&notice(ConfirmStatus::Disproved, "a@example.com"))
            .unwrap();
        assert!(message.body.contains("رد شد"));
        assert!(!message.body.contains("https://"));
    }
}
