pub mod api;
pub mod engine;
pub mod labels;
pub mod preprocess;
pub mod service;

pub use engine::{Engine, EngineError};
pub use labels::ClassNames;
pub use service::{NeuralNetworkService, NnError};
