use anyhow::Result;
use async_trait::async_trait;

use super::traits::QuotaProvider;
use super::types::QuotaProfile;
use crate::db::Database;

const DEFAULT_PLAN: &str = "free";

/// Quota profiles stored per user, falling back to the configured default limit
#[derive(Clone)]
pub struct QuotaService {
    db: Database,
    default_action_limit: Option<u64>,
}

impl QuotaService {
    pub fn new(db: Database, default_action_limit: Option<u64>) -> Self {
        Self {
            db,
            default_action_limit,
        }
    }
}

#[async_trait]
impl QuotaProvider for QuotaService {
    async fn get_user_quota(&self, user_id: &str) -> Result<QuotaProfile> {
        let profile = match self.db.get_user_quota(user_id).await? {
            Some(quota) => QuotaProfile {
                plan: quota.plan,
                // A negative stored limit blocks every action
                copilot_action_limit: quota
                    .copilot_action_limit
                    .map(|limit| u64::try_from(limit).unwrap_or(0)),
            },
            None => QuotaProfile {
                plan: DEFAULT_PLAN.to_string(),
                copilot_action_limit: self.default_action_limit,
            },
        };
        Ok(profile)
    }
}
