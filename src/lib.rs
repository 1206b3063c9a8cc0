pub mod aggregate;
pub mod config;
pub mod derive;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod table;

pub use error::LoadError;
pub use load::{LoadCache, LoadOutcome};
pub use pipeline::run_pipeline;
pub use render::RenderModel;
pub use table::SalesTable;
