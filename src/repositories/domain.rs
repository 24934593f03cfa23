use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::entity::domain::{Column, Entity as DomainEntity};
use crate::error::AppResult;
use crate::store::DomainStore;

/// Domain repository for database operations
#[derive(Clone)]
pub struct DomainRepository {
    db: DatabaseConnection,
}

impl DomainRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DomainStore for DomainRepository {
    async fn verified_domain_names(&self, env_id: i64) -> AppResult<Vec<String>> {
        let names: Vec<String> = DomainEntity::find()
            .select_only()
            .column(Column::DomainName)
            .filter(Column::EnvId.eq(env_id))
            .filter(Column::DomainVerified.eq(true))
            .order_by_asc(Column::DomainId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(names)
    }
}
