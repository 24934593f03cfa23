//! Config query strategies.
//!
//! Each resolution mode builds its own parameterized SELECT producing rows of
//! the same shape ([`ConfigRow`]); the strategies share only the projection.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};

use crate::entity::{app, deployment, deployment_published, domain, environment, user};
use crate::error::{AppError, AppResult};
use crate::models::{BuildConf, BuildManifest, ConfigRecord, CustomCert};

/// Raw projection shared by every strategy
#[derive(Debug, Clone, FromQueryResult)]
pub struct ConfigRow {
    pub app_id: i64,
    pub env_id: i64,
    pub env_name: String,
    pub display_name: String,
    pub deployment_id: i64,
    pub storage_location: Option<String>,
    pub function_location: Option<String>,
    pub api_location: Option<String>,
    pub build_manifest: Option<serde_json::Value>,
    pub build_conf: serde_json::Value,
    pub percentage: Option<f64>,
    pub domain_id: Option<i64>,
    pub domain_name: Option<String>,
    pub custom_cert_value: Option<String>,
    pub custom_cert_key: Option<String>,
    pub owner_tier: Option<String>,
}

impl TryFrom<ConfigRow> for ConfigRecord {
    type Error = AppError;

    fn try_from(row: ConfigRow) -> AppResult<Self> {
        let build_conf: BuildConf = serde_json::from_value(row.build_conf).map_err(|e| {
            AppError::Internal(format!("Invalid build config for env {}: {}", row.env_id, e))
        })?;

        let build_manifest: Option<BuildManifest> = row
            .build_manifest
            .filter(|v| !v.is_null())
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                AppError::Internal(format!(
                    "Invalid build manifest for deployment {}: {}",
                    row.deployment_id, e
                ))
            })?;

        Ok(Self {
            app_id: row.app_id,
            env_id: row.env_id,
            env_name: row.env_name,
            display_name: row.display_name,
            deployment_id: row.deployment_id,
            storage_location: row.storage_location,
            function_location: row.function_location,
            api_location: row.api_location,
            build_manifest,
            build_conf,
            percentage: row.percentage.unwrap_or(0.0),
            domain_id: row.domain_id,
            domain_name: row.domain_name,
            custom_cert: CustomCert::from_parts(row.custom_cert_value, row.custom_cert_key),
            owner_tier: row.owner_tier,
        })
    }
}

fn project<E: EntityTrait>(select: Select<E>) -> Select<E> {
    select
        .select_only()
        .column_as(app::Column::AppId, "app_id")
        .column_as(environment::Column::EnvId, "env_id")
        .column_as(environment::Column::EnvName, "env_name")
        .column_as(app::Column::DisplayName, "display_name")
        .column_as(deployment::Column::DeploymentId, "deployment_id")
        .column_as(deployment::Column::StorageLocation, "storage_location")
        .column_as(deployment::Column::FunctionLocation, "function_location")
        .column_as(deployment::Column::ApiLocation, "api_location")
        .column_as(deployment::Column::BuildManifest, "build_manifest")
        .column_as(environment::Column::BuildConf, "build_conf")
        .column_as(deployment_published::Column::PercentageReleased, "percentage")
        .column_as(user::Column::PackageTier, "owner_tier")
}

fn without_domain<E: EntityTrait>(select: Select<E>) -> Select<E> {
    select
        .expr_as(Expr::cust("NULL::bigint"), "domain_id")
        .expr_as(Expr::cust("NULL::text"), "domain_name")
        .expr_as(Expr::cust("NULL::text"), "custom_cert_value")
        .expr_as(Expr::cust("NULL::text"), "custom_cert_key")
}

fn live<E: EntityTrait>(select: Select<E>) -> Select<E> {
    select
        .filter(app::Column::DeletedAt.is_null())
        .filter(environment::Column::DeletedAt.is_null())
        .filter(deployment::Column::DeletedAt.is_null())
}

/// Single deployment preview; the percentage comes from the deployment's
/// own publish record and is null when it is not published.
pub fn by_deployment(display_name: &str, deployment_id: i64) -> Select<deployment::Entity> {
    let select = deployment::Entity::find()
        .join(JoinType::InnerJoin, deployment::Relation::Environment.def())
        .join(JoinType::InnerJoin, environment::Relation::App.def())
        .join(JoinType::LeftJoin, app::Relation::User.def())
        .join(JoinType::LeftJoin, deployment::Relation::Published.def());

    live(without_domain(project(select)))
        .filter(deployment::Column::DeploymentId.eq(deployment_id))
        .filter(app::Column::DisplayName.eq(display_name))
        .limit(1)
}

/// Verified domain joined to every published deployment of its environment
pub fn by_domain(domain_name: &str) -> Select<domain::Entity> {
    let select = domain::Entity::find()
        .join(JoinType::InnerJoin, domain::Relation::Environment.def())
        .join(JoinType::InnerJoin, environment::Relation::App.def())
        .join(JoinType::LeftJoin, app::Relation::User.def())
        .join(JoinType::InnerJoin, environment::Relation::Published.def())
        .join(
            JoinType::InnerJoin,
            deployment_published::Relation::Deployment.def(),
        );

    live(project(select))
        .column_as(domain::Column::DomainId, "domain_id")
        .column_as(domain::Column::DomainName, "domain_name")
        .column_as(domain::Column::CustomCertValue, "custom_cert_value")
        .column_as(domain::Column::CustomCertKey, "custom_cert_key")
        .filter(domain::Column::DomainName.eq(domain_name.to_ascii_lowercase()))
        .filter(domain::Column::DomainVerified.eq(true))
        .order_by_asc(deployment::Column::DeploymentId)
}

/// Environment of an app by display name, joined to its published deployments
pub fn by_display_name(display_name: &str, env_name: &str) -> Select<app::Entity> {
    let select = app::Entity::find()
        .join(JoinType::InnerJoin, app::Relation::Environments.def())
        .join(JoinType::LeftJoin, app::Relation::User.def())
        .join(JoinType::InnerJoin, environment::Relation::Published.def())
        .join(
            JoinType::InnerJoin,
            deployment_published::Relation::Deployment.def(),
        );

    live(without_domain(project(select)))
        .filter(app::Column::DisplayName.eq(display_name))
        .filter(environment::Column::EnvName.eq(env_name))
        .order_by_asc(deployment::Column::DeploymentId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql<E: EntityTrait>(select: Select<E>) -> String {
        select.build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn test_by_deployment_query() {
        let sql = sql(by_deployment("my-app", 42));

        assert!(sql.starts_with("SELECT"));
        assert!(sql.contains(r#"FROM "deployments""#));
        assert!(sql.contains(r#"LEFT JOIN "deployments_published""#));
        assert!(sql.contains(r#""deployments"."deployment_id" = 42"#));
        assert!(sql.contains(r#""apps"."display_name" = 'my-app'"#));
        assert!(sql.contains("NULL::bigint AS \"domain_id\""));
        assert!(sql.contains("LIMIT 1"));
    }

    #[test]
    fn test_by_domain_query() {
        let sql = sql(by_domain("WWW.Example.org"));

        assert!(sql.contains(r#"FROM "domains""#));
        assert!(sql.contains(r#"INNER JOIN "apps_build_conf""#));
        assert!(sql.contains(r#"INNER JOIN "deployments_published""#));
        assert!(sql.contains(r#""domains"."domain_name" = 'www.example.org'"#));
        assert!(sql.contains(r#""domains"."domain_verified" = "#));
        assert!(sql.contains(r#""domains"."custom_cert_value" AS "custom_cert_value""#));
        assert!(sql.contains(r#""apps_build_conf"."deleted_at" IS NULL"#));
    }

    #[test]
    fn test_by_display_name_query() {
        let sql = sql(by_display_name("my-app", "staging"));

        assert!(sql.contains(r#"FROM "apps""#));
        assert!(sql.contains(r#""apps_build_conf"."env_name" = 'staging'"#));
        assert!(sql.contains(r#"INNER JOIN "deployments""#));
        assert!(sql.contains(r#"ORDER BY "deployments"."deployment_id" ASC"#));
        assert!(!sql.contains(r#""domains"."#));
    }

    #[test]
    fn test_row_conversion() {
        let row = ConfigRow {
            app_id: 1,
            env_id: 2,
            env_name: "production".to_string(),
            display_name: "my-app".to_string(),
            deployment_id: 3,
            storage_location: Some("local:/deployments/3".to_string()),
            function_location: None,
            api_location: None,
            build_manifest: Some(serde_json::json!({"cdnFiles": [{"name": "/index.html"}]})),
            build_conf: serde_json::json!({"vars": {"A": "1"}}),
            percentage: None,
            domain_id: None,
            domain_name: None,
            custom_cert_value: Some("cert".to_string()),
            custom_cert_key: None,
            owner_tier: Some("free".to_string()),
        };

        let record = ConfigRecord::try_from(row).unwrap();
        assert_eq!(record.percentage, 0.0);
        assert_eq!(record.build_conf.vars["A"], "1");
        assert_eq!(record.build_manifest.unwrap().cdn_files.len(), 1);
        assert!(record.custom_cert.is_none());
    }

    #[test]
    fn test_row_conversion_rejects_bad_build_conf() {
        let row = ConfigRow {
            app_id: 1,
            env_id: 2,
            env_name: "production".to_string(),
            display_name: "my-app".to_string(),
            deployment_id: 3,
            storage_location: None,
            function_location: None,
            api_location: None,
            build_manifest: None,
            build_conf: serde_json::json!({"vars": "not-a-map"}),
            percentage: Some(100.0),
            domain_id: None,
            domain_name: None,
            custom_cert_value: None,
            custom_cert_key: None,
            owner_tier: None,
        };

        assert!(matches!(
            ConfigRecord::try_from(row),
            Err(AppError::Internal(_))
        ));
    }
}
