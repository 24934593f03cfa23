pub mod app;
pub mod deployment;
pub mod deployment_published;
pub mod domain;
pub mod environment;
pub mod snippet;
pub mod user;
pub mod webhook;

pub mod prelude;

pub use prelude::*;
