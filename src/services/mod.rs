//! Service layer for business logic
//!
//! Services own the rules of the platform (reward bookkeeping, grading,
//! moderation, statistics, accounts) and are shared by the HTTP handlers
//! and the CLI.

pub mod account_service;
pub mod admin_service;
pub mod comment_service;
pub mod config_service;
pub mod dto;
pub mod exam_service;
pub mod moderation_service;
pub mod notifications;
pub mod reaction_service;
pub mod statistics_service;
pub mod tutorial_service;

pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use comment_service::CommentService;
pub use config_service::ConfigService;
pub use exam_service::ExamService;
pub use moderation_service::{ActionReport, ModerationService};
pub use notifications::{Mailer, NotificationResult};
pub use reaction_service::{ReactionService, RelationList};
pub use statistics_service::StatisticsService;
pub use tutorial_service::TutorialService;
