pub mod adapter;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod status;
pub mod surface;
pub mod timer;

pub use adapter::*;
pub use decoder::*;
pub use engine::*;
pub use error::*;
pub use orchestrator::*;
pub use params::*;
pub use status::*;
pub use surface::*;
pub use timer::*;
