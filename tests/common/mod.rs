pub mod app;
pub mod factory;

#[allow(unused_imports)]
pub use app::{test_config, RecordingSender, TestApp};
#[allow(unused_imports)]
pub use factory::{build_conf_with_redirects, manifest_with_files, Factory};
