use thiserror::Error;

use super::preprocess::ImageTensor;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model failed to load: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// One preprocessed image in, one score per class out.
pub trait Engine: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, EngineError>;
}

#[cfg(feature = "tensorflow")]
pub use self::saved_model::SavedModelEngine;

#[cfg(feature = "tensorflow")]
mod saved_model {
    use std::path::Path;
    use std::time::Instant;

    use tensorflow::{Graph, SavedModelBundle, SessionOptions, SessionRunArgs, Tensor};

    use super::{Engine, EngineError, ImageTensor};

    fn tf_error(e: tensorflow::Status) -> EngineError {
        EngineError::Inference(e.to_string())
    }

    /// A TensorFlow SavedModel exported from the fine-tuned ResNet50.
    pub struct SavedModelEngine {
        graph: Graph,
        bundle: SavedModelBundle,
        input_op: String,
        output_op: String,
    }

    impl SavedModelEngine {
        pub fn load(export_dir: &Path, input_op: &str, output_op: &str) -> Result<Self, EngineError> {
            let started = Instant::now();
            let mut graph = Graph::new();
            let bundle =
                SavedModelBundle::load(&SessionOptions::new(), &["serve"], &mut graph, export_dir)
                    .map_err(|e| EngineError::Load(e.to_string()))?;
            //both ops must exist in the graph
            graph
                .operation_by_name_required(input_op)
                .map_err(|e| EngineError::Load(e.to_string()))?;
            graph
                .operation_by_name_required(output_op)
                .map_err(|e| EngineError::Load(e.to_string()))?;
            log::info!(
                "loaded model from {} in {} msec",
                export_dir.display(),
                started.elapsed().as_millis()
            );
            Ok(SavedModelEngine {
                graph,
                bundle,
                input_op: input_op.to_string(),
                output_op: output_op.to_string(),
            })
        }
    }

    impl Engine for SavedModelEngine {
        fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, EngineError> {
            let started = Instant::now();
            let tensor = Tensor::new(&input.shape())
                .with_values(&input.data)
                .map_err(tf_error)?;

            let mut args = SessionRunArgs::new();
            let input_op = self
                .graph
                .operation_by_name_required(&self.input_op)
                .map_err(tf_error)?;
            args.add_feed(&input_op, 0, &tensor);
            let output_op = self
                .graph
                .operation_by_name_required(&self.output_op)
                .map_err(tf_error)?;
            let token = args.request_fetch(&output_op, 0);

            self.bundle.session.run(&mut args).map_err(tf_error)?;
            let output: Tensor<f32> = args.fetch(token).map_err(tf_error)?;
            log::debug!("session run took {} msec", started.elapsed().as_millis());
            Ok(output.to_vec())
        }
    }
}
