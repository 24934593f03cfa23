pub mod config_query;
pub mod deployment;
pub mod domain;
pub mod environment;
pub mod snippet;
pub mod webhook;

pub use deployment::DeploymentRepository;
pub use domain::DomainRepository;
pub use environment::EnvironmentRepository;
pub use snippet::SnippetRepository;
pub use webhook::WebhookRepository;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::store::Stores;

/// Database-backed collaborator stores sharing one connection pool
pub fn sea_orm_stores(db: DatabaseConnection) -> Stores {
    Stores {
        deployments: Arc::new(DeploymentRepository::new(db.clone())),
        domains: Arc::new(DomainRepository::new(db.clone())),
        environments: Arc::new(EnvironmentRepository::new(db.clone())),
        snippets: Arc::new(SnippetRepository::new(db.clone())),
        webhooks: Arc::new(WebhookRepository::new(db)),
    }
}
