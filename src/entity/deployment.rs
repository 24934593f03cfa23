use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deployments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub deployment_id: i64,
    pub app_id: i64,
    pub env_id: i64,
    pub storage_location: Option<String>,
    pub function_location: Option<String>,
    pub api_location: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub build_manifest: Option<Json>,
    pub exit_code: Option<i32>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub deleted_at: Option<TimeDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::environment::Entity",
        from = "Column::EnvId",
        to = "super::environment::Column::EnvId"
    )]
    Environment,
    #[sea_orm(has_many = "super::deployment_published::Entity")]
    Published,
}

impl Related<super::environment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Environment.def()
    }
}

impl Related<super::deployment_published::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Published.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
