use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::snippet::{self, Column, Entity as SnippetEntity};
use crate::error::{AppError, AppResult};
use crate::models::{decode_rules, Snippet};
use crate::store::SnippetStore;

/// Snippet repository for database operations
#[derive(Clone)]
pub struct SnippetRepository {
    db: DatabaseConnection,
}

impl SnippetRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnippetStore for SnippetRepository {
    async fn enabled_snippets(&self, env_id: i64) -> AppResult<Vec<Snippet>> {
        let models = SnippetEntity::find()
            .filter(Column::EnvId.eq(env_id))
            .filter(Column::Enabled.eq(true))
            .order_by_asc(Column::SnippetId)
            .all(&self.db)
            .await?;

        let mut snippets = Vec::with_capacity(models.len());
        for model in models {
            match Snippet::try_from(model) {
                Ok(s) => snippets.push(s),
                // Rules are validated on write; a bad row only loses its own snippet
                Err(e) => tracing::warn!(env_id, error = %e, "Skipping malformed snippet"),
            }
        }

        Ok(snippets)
    }
}

// Conversion from SeaORM model to our domain model
impl TryFrom<snippet::Model> for Snippet {
    type Error = AppError;

    fn try_from(m: snippet::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.snippet_id,
            app_id: m.app_id,
            env_id: m.env_id,
            title: m.snippet_title,
            content: m.snippet_content,
            location: m.snippet_location.parse()?,
            prepend: m.should_prepend,
            enabled: m.enabled,
            rules: decode_rules(m.snippet_rules)?,
        })
    }
}
