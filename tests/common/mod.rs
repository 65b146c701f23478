//! Shared setup for the integration tests: a throwaway SQLite database,
//! a mailer that records messages, and fixture builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use actix_web::cookie::Cookie;
use actix_web::web;
use async_trait::async_trait;
use tempfile::TempDir;

use majazamooz::api::AppState;
use majazamooz::api::constants::SESSION_COOKIE_NAME;
use majazamooz::config::{
    DatabaseConfig, RuntimeConfig, StaticConfig, get_config, init_config_with, keys,
};
use majazamooz::errors::Result;
use majazamooz::services::exam_service::{ExamForm, QuestionForm};
use majazamooz::services::notifications::{EmailMessage, Mailer};
use majazamooz::storage::SeaOrmStorage;
use majazamooz::storage::backend::{NewComment, NewTutorial, NewUser};
use majazamooz::utils::password::hash_password;
use migration::entities::{exam, question, tutorial, tutorial_comment, user};

pub const PASSWORD: &str = "correct horse 42";

static INIT: Once = Once::new();

pub fn init_test_config() {
    INIT.call_once(|| {
        // Defaults only, so a local config.toml or MJ__* variable cannot leak in.
        init_config_with(StaticConfig::default());
    });
}

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == address)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

pub struct TestEnv {
    pub storage: Arc<SeaOrmStorage>,
    pub runtime: Arc<RuntimeConfig>,
    pub mailer: Arc<RecordingMailer>,
    pub state: web::Data<AppState>,
    _dir: TempDir,
}

/// Fresh database with fixed reward values, so balances are predictable.
pub async fn setup() -> TestEnv {
    init_test_config();

    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("majazamooz_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::connect(&DatabaseConfig {
            database_url: db_url,
            ..Default::default()
        })
            .await
            .expect("Failed to create storage"),
    );
    let runtime = Arc::new(
        RuntimeConfig::init(storage.get_db().clone())
            .await
            .expect("Failed to init runtime config"),
    );

    for (key, value) in [
        (keys::TUTORIAL_LIKE_SCORE, "5"),
        (keys::TUTORIAL_LIKE_COIN, "4"),
        (keys::TUTORIAL_VIEW_SCORE, "1"),
        (keys::TUTORIAL_VIEW_COIN, "2"),
        (keys::TUTORIAL_COMMENT_LIKE_SCORE, "3"),
        (keys::TUTORIAL_COMMENT_LIKE_COIN, "3"),
        (keys::EXAM_LIKE_SCORE, "2"),
        (keys::EXAM_LIKE_COIN, "1"),
    ] {
        runtime
            .set(key, value, Some("test"))
            .await
            .expect("Failed to set reward");
    }

    let mailer = Arc::new(RecordingMailer::default());
    let config = get_config();
    let state = web::Data::new(AppState::new(
        storage.clone(),
        runtime.clone(),
        mailer.clone(),
        config.site.clone(),
        config.auth.clone(),
    ));

    TestEnv {
        storage,
        runtime,
        mailer,
        state,
        _dir: dir,
    }
}

impl TestEnv {
    pub async fn user(&self, username: &str) -> user::Model {
        self.create_user(username, false).await
    }

    pub async fn staff(&self, username: &str) -> user::Model {
        self.create_user(username, true).await
    }

    async fn create_user(&self, username: &str, is_staff: bool) -> user::Model {
        self.storage
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: hash_password(PASSWORD).expect("hash"),
                is_staff,
                email_confirmed: true,
            })
            .await
            .expect("Failed to create user")
    }

    pub async fn reload(&self, user: &user::Model) -> user::Model {
        self.storage
            .find_user(user.id)
            .await
            .expect("lookup")
            .expect("user exists")
    }

    /// A tutorial still waiting for moderation.
    pub async fn waiting_tutorial(&self, author: &user::Model, title: &str) -> tutorial::Model {
        self.storage
            .create_tutorial(NewTutorial {
                title: title.to_string(),
                slug: title.replace(' ', "-"),
                short_description: format!("{} in short", title),
                body: format!("{} body", title),
                image: None,
                author_id: Some(author.id),
            })
            .await
            .expect("Failed to create tutorial")
    }

    pub async fn tutorial(&self, author: &user::Model, title: &str) -> tutorial::Model {
        let created = self.waiting_tutorial(author, title).await;
        self.state
            .moderation
            .confirm_tutorials(&[created.id])
            .await
            .expect("confirm tutorial");
        self.mailer.clear();
        self.storage
            .find_tutorial(created.id)
            .await
            .expect("lookup")
            .expect("tutorial exists")
    }

    pub async fn waiting_comment(
        &self,
        author: &user::Model,
        tutorial: &tutorial::Model,
        parent: Option<&tutorial_comment::Model>,
        title: &str,
    ) -> tutorial_comment::Model {
        self.storage
            .create_comment(NewComment {
                title: title.to_string(),
                body: format!("{} body", title),
                tutorial_id: tutorial.id,
                parent_comment_id: parent.map(|p| p.id),
                user_id: Some(author.id),
                allow_reply: true,
                notify_replies: true,
            })
            .await
            .expect("Failed to create comment")
    }

    pub async fn comment(
        &self,
        author: &user::Model,
        tutorial: &tutorial::Model,
        title: &str,
    ) -> tutorial_comment::Model {
        let created = self.waiting_comment(author, tutorial, None, title).await;
        self.state
            .moderation
            .confirm_comments(&[created.id])
            .await
            .expect("confirm comment");
        self.mailer.clear();
        self.storage
            .find_comment(created.id)
            .await
            .expect("lookup")
            .expect("comment exists")
    }

    /// A confirmed exam whose questions all have choice 1 as the answer.
    pub async fn exam(
        &self,
        designer: &user::Model,
        title: &str,
        question_count: usize,
        coin_cost: i64,
    ) -> (exam::Model, Vec<question::Model>) {
        let exams = &self.state.exams;
        let created = exams
            .create_exam(designer.id, exam_form(title, coin_cost))
            .await
            .expect("Failed to create exam");

        let mut questions = Vec::with_capacity(question_count);
        for i in 0..question_count {
            let q = exams
                .create_question(created.id, question_form(&format!("Question {}", i + 1)))
                .await
                .expect("Failed to create question");
            questions.push(q);
        }

        self.state
            .moderation
            .confirm_exams(&[created.id])
            .await
            .expect("confirm exam");
        let confirmed = self
            .storage
            .find_exam(created.id)
            .await
            .expect("lookup")
            .expect("exam exists");
        (confirmed, questions)
    }

    pub fn session_cookie(&self, user: &user::Model) -> Cookie<'static> {
        let token = self
            .state
            .jwt
            .generate_session_token(user.id, false)
            .expect("token");
        Cookie::new(SESSION_COOKIE_NAME, token)
    }
}

pub fn exam_form(title: &str, coin_cost: i64) -> ExamForm {
    ExamForm {
        title: title.to_string(),
        short_description: format!("{} summary", title),
        full_description: String::new(),
        deadline_duration_seconds: 600,
        waiting_duration_seconds: 60,
        starts_at: None,
        ends_at: None,
        coin_cost,
        diamond_cost: 0,
        correct_score: 3,
        blank_score: 0,
        incorrect_score: -1,
        correct_coin: 2,
        category_ids: Vec::new(),
    }
}

pub fn question_form(text: &str) -> QuestionForm {
    QuestionForm {
        text: text.to_string(),
        choice_1: "right".to_string(),
        choice_2: "wrong".to_string(),
        choice_3: "also wrong".to_string(),
        choice_4: "still wrong".to_string(),
        correct_choice: 1,
        correct_full_answer: "The first choice".to_string(),
        is_active: true,
    }
}

/// Test app with the same middleware and routes as the server.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(majazamooz::api::middleware::SessionAuth)
                .configure(majazamooz::api::services::configure_routes),
        )
        .await
    };
}
