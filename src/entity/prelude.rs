pub use super::app::Entity as App;
pub use super::deployment::Entity as Deployment;
pub use super::deployment_published::Entity as DeploymentPublished;
pub use super::domain::Entity as Domain;
pub use super::environment::Entity as Environment;
pub use super::snippet::Entity as Snippet;
pub use super::user::Entity as User;
pub use super::webhook::Entity as Webhook;
