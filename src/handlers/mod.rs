pub mod cli;
pub mod pipeline;

pub use cli::run_cli;
#[cfg(feature = "server")]
pub use pipeline::IngredientPipeline;
