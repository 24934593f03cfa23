pub mod app;
pub mod config;
pub mod deployment;
pub mod domain;
pub mod environment;
pub mod redirect;
pub mod snippet;
pub mod webhook;

pub use app::*;
pub use config::*;
pub use deployment::*;
pub use domain::*;
pub use environment::*;
pub use redirect::*;
pub use snippet::*;
pub use webhook::*;
