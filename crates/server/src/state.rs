use crate::{config::Config, copilot::CopilotService, db::Database};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub copilot: CopilotService,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let copilot = CopilotService::from_config(db.clone(), &config.copilot);
        Self {
            db,
            config,
            copilot,
        }
    }
}
