pub mod category;
pub mod config_history;
pub mod exam;
pub mod exam_category;
pub mod exam_like;
pub mod exam_participation;
pub mod participant_answer;
pub mod question;
pub mod system_config;
pub mod tutorial;
pub mod tutorial_category;
pub mod tutorial_comment;
pub mod tutorial_comment_down_vote;
pub mod tutorial_comment_like;
pub mod tutorial_comment_up_vote;
pub mod tutorial_down_vote;
pub mod tutorial_like;
pub mod tutorial_up_vote;
pub mod tutorial_view;
pub mod user;

pub use category::Entity as CategoryEntity;
pub use config_history::Entity as ConfigHistoryEntity;
pub use exam::Entity as ExamEntity;
pub use exam_participation::Entity as ExamParticipationEntity;
pub use participant_answer::Entity as ParticipantAnswerEntity;
pub use question::Entity as QuestionEntity;
pub use system_config::Entity as SystemConfigEntity;
pub use tutorial::Entity as TutorialEntity;
pub use tutorial_comment::Entity as TutorialCommentEntity;
pub use user::Entity as UserEntity;
