use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::webhook::{self, Column, Entity as WebhookEntity};
use crate::error::{AppError, AppResult};
use crate::models::{TriggerWhen, Webhook};
use crate::store::WebhookStore;

/// Outbound webhook repository
#[derive(Clone)]
pub struct WebhookRepository {
    db: DatabaseConnection,
}

impl WebhookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WebhookStore for WebhookRepository {
    async fn webhooks_for(&self, app_id: i64, trigger: TriggerWhen) -> AppResult<Vec<Webhook>> {
        let models = WebhookEntity::find()
            .filter(Column::AppId.eq(app_id))
            .filter(Column::TriggerWhen.eq(trigger.as_str()))
            .order_by_asc(Column::WhId)
            .all(&self.db)
            .await?;

        models.into_iter().map(Webhook::try_from).collect()
    }
}

impl TryFrom<webhook::Model> for Webhook {
    type Error = AppError;

    fn try_from(m: webhook::Model) -> Result<Self, Self::Error> {
        let request_headers: BTreeMap<String, String> = match m.request_headers {
            None | Some(serde_json::Value::Null) => BTreeMap::new(),
            Some(v) => serde_json::from_value(v)
                .map_err(|e| AppError::Internal(format!("Invalid webhook headers: {}", e)))?,
        };

        Ok(Self {
            id: m.wh_id,
            app_id: m.app_id,
            request_url: m.request_url,
            request_method: m.request_method,
            request_headers,
            request_payload: m.request_payload,
            trigger_when: m.trigger_when.parse()?,
        })
    }
}
