use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "snippets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub snippet_id: i64,
    pub app_id: i64,
    pub env_id: i64,
    pub snippet_title: String,
    pub snippet_content: String,
    pub snippet_location: String,
    pub should_prepend: bool,
    pub enabled: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub snippet_rules: Option<Json>,
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
