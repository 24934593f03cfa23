use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::error::AppResult;
use crate::models::ConfigRecord;
use crate::repositories::config_query::{self, ConfigRow};
use crate::store::{ConfigFilter, DeploymentStore};

/// Deployment repository for config reads
#[derive(Clone)]
pub struct DeploymentRepository {
    db: DatabaseConnection,
}

impl DeploymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeploymentStore for DeploymentRepository {
    async fn find_configs(&self, filter: &ConfigFilter) -> AppResult<Vec<ConfigRecord>> {
        let rows: Vec<ConfigRow> = match filter {
            ConfigFilter::ByDeployment {
                display_name,
                deployment_id,
            } => {
                config_query::by_deployment(display_name, *deployment_id)
                    .into_model::<ConfigRow>()
                    .all(&self.db)
                    .await?
            }
            ConfigFilter::ByDomain { domain_name } => {
                config_query::by_domain(domain_name)
                    .into_model::<ConfigRow>()
                    .all(&self.db)
                    .await?
            }
            ConfigFilter::ByDisplayName {
                display_name,
                env_name,
            } => {
                config_query::by_display_name(display_name, env_name)
                    .into_model::<ConfigRow>()
                    .all(&self.db)
                    .await?
            }
        };

        rows.into_iter().map(ConfigRecord::try_from).collect()
    }
}
