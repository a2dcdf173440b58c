pub mod config;
pub mod fixture;
pub mod render;
pub mod session;
pub mod tracing_setup;

pub use config::CliConfig;
pub use fixture::Fixture;
pub use render::{render_row, RenderedRow};
pub use session::{build_query, Session};
pub use tracing_setup::init_tracing;
