pub mod classifier;
pub mod dataset;
pub mod encoder;
pub mod engine;
pub mod forest;
pub mod model_store;
pub mod recommender;
pub mod training;

pub use engine::{Engine, EngineSummary, ModelOrigin};
