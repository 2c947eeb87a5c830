//! Model artifacts: feature schema, scaler and classifier backends

pub mod classifier;
pub mod loader;
pub mod onnx;
pub mod scaler;
pub mod schema;

pub use classifier::{Classifier, LogisticModel};
pub use loader::ModelBundle;
pub use onnx::OnnxClassifier;
pub use scaler::Scaler;
pub use schema::FeatureSchema;
