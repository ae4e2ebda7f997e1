mod command;
mod engine;

pub use command::EngineCommand;
pub use engine::{EngineHandles, MeshConfig, MeshEngine};
