use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "domains")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub domain_id: i64,
    pub app_id: i64,
    pub env_id: i64,
    pub domain_name: String,
    pub domain_verified: bool,
    pub domain_verified_at: Option<TimeDateTimeWithTimeZone>,
    pub custom_cert_value: Option<String>,
    pub custom_cert_key: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub last_ping: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::environment::Entity",
        from = "Column::EnvId",
        to = "super::environment::Column::EnvId"
    )]
    Environment,
}

impl Related<super::environment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Environment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
