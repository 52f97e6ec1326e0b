//! CLI command handlers, one file per subcommand.

mod completions;
mod config;
mod points;
mod run;

pub use completions::run_completions;
pub use config::run_config;
pub use points::run_points;
pub use run::{run_batch, RunArgs};
#[cfg(test)]
pub(crate) use run::effective_config;
