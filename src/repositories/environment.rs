use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entity::app::{Column as AppColumn, Entity as AppEntity, Relation as AppRelation};
use crate::entity::domain::{Column as DomainColumn, Entity as DomainEntity};
use crate::entity::environment::{self, Column, Entity as EnvironmentEntity};
use crate::error::{AppError, AppResult};
use crate::models::{AffectedDomains, BuildConf, Environment};
use crate::store::EnvironmentStore;

/// Environment repository for database operations
#[derive(Clone)]
pub struct EnvironmentRepository {
    db: DatabaseConnection,
}

impl EnvironmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EnvironmentStore for EnvironmentRepository {
    async fn find_environment(&self, env_id: i64) -> AppResult<Option<Environment>> {
        let model = EnvironmentEntity::find_by_id(env_id).one(&self.db).await?;
        model.map(Environment::try_from).transpose()
    }

    async fn display_names(&self, env_id: i64) -> AppResult<Vec<String>> {
        let names: Vec<String> = AppEntity::find()
            .select_only()
            .column(AppColumn::DisplayName)
            .distinct()
            .join(JoinType::InnerJoin, AppRelation::Environments.def())
            .filter(Column::EnvId.eq(env_id))
            .order_by_asc(AppColumn::DisplayName)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(names)
    }

    async fn delete_environment(&self, env_id: i64) -> AppResult<AffectedDomains> {
        let affected = self
            .db
            .transaction::<_, AffectedDomains, AppError>(|txn| {
                Box::pin(async move {
                    let env = EnvironmentEntity::find_by_id(env_id)
                        .filter(Column::DeletedAt.is_null())
                        .one(txn)
                        .await?
                        .ok_or_else(|| AppError::NotFound("Environment".to_string()))?;

                    let app_id = env.app_id;
                    let mut active = env.into_active_model();
                    active.deleted_at = Set(Some(time::OffsetDateTime::now_utc()));
                    active.update(txn).await?;

                    let domain_names: Vec<String> = DomainEntity::find()
                        .select_only()
                        .column(DomainColumn::DomainName)
                        .filter(DomainColumn::EnvId.eq(env_id))
                        .filter(DomainColumn::DomainVerified.eq(true))
                        .order_by_asc(DomainColumn::DomainId)
                        .into_tuple()
                        .all(txn)
                        .await?;

                    DomainEntity::update_many()
                        .col_expr(DomainColumn::DomainVerified, Expr::value(false))
                        .col_expr(
                            DomainColumn::DomainVerifiedAt,
                            Expr::value(Option::<time::OffsetDateTime>::None),
                        )
                        .filter(DomainColumn::EnvId.eq(env_id))
                        .exec(txn)
                        .await?;

                    Ok(AffectedDomains {
                        env_id,
                        app_id,
                        domain_names,
                    })
                })
            })
            .await?;

        tracing::info!(
            env_id,
            domains = affected.domain_names.len(),
            "Environment deleted"
        );

        Ok(affected)
    }
}

impl TryFrom<environment::Model> for Environment {
    type Error = AppError;

    fn try_from(m: environment::Model) -> Result<Self, Self::Error> {
        let build_conf: BuildConf = serde_json::from_value(m.build_conf).map_err(|e| {
            AppError::Internal(format!("Invalid build config for env {}: {}", m.env_id, e))
        })?;

        Ok(Self {
            id: m.env_id,
            app_id: m.app_id,
            name: m.env_name,
            branch: m.branch,
            auto_publish: m.auto_publish,
            auto_deploy: m.auto_deploy,
            build_conf,
            updated_at: m.updated_at,
            deleted_at: m.deleted_at,
        })
    }
}
