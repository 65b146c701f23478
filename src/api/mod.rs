//! HTTP layer: shared state, middleware and route handlers.

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use crate::config::{AuthConfig, RuntimeConfig, SiteConfig};
use crate::services::{
    AccountService, AdminService, CommentService, ConfigService, ExamService, Mailer,
    ModerationService, ReactionService, StatisticsService, TutorialService,
};
use crate::storage::SeaOrmStorage;

use jwt::JwtService;

/// Everything a handler needs, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub runtime: Arc<RuntimeConfig>,
    pub jwt: Arc<JwtService>,
    pub auth: AuthConfig,
    pub accounts: AccountService,
    pub admin: AdminService,
    pub comments: CommentService,
    pub config: ConfigService,
    pub exams: ExamService,
    pub moderation: ModerationService,
    pub reactions: ReactionService,
    pub statistics: StatisticsService,
    pub tutorials: TutorialService,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        runtime: Arc<RuntimeConfig>,
        mailer: Arc<dyn Mailer>,
        site: SiteConfig,
        auth: AuthConfig,
    ) -> Self {
        let jwt = Arc::new(JwtService::from_runtime(&runtime));
        Self {
            accounts: AccountService::new(
                storage.clone(),
                jwt.clone(),
                mailer.clone(),
                site.clone(),
            ),
            admin: AdminService::new(storage.clone(), runtime.clone()),
            comments: CommentService::new(storage.clone(), runtime.clone()),
            config: ConfigService::new(runtime.clone()),
            exams: ExamService::new(storage.clone(), runtime.clone()),
            moderation: ModerationService::new(storage.clone(), mailer, site.clone()),
            reactions: ReactionService::new(storage.clone(), runtime.clone()),
            statistics: StatisticsService::new(storage.clone(), runtime.clone(), site.timezone()),
            tutorials: TutorialService::new(storage.clone(), runtime.clone()),
            storage,
            runtime,
            jwt,
            auth,
            started_at: chrono::Utc::now(),
        }
    }
}
