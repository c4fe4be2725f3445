pub mod acne;
pub mod backend;
pub mod disease;
pub mod manager;
pub mod skin_type;

pub use acne::AcnePredictor;
pub use backend::{InferenceModel, InputLayout, OnnxModel};
pub use disease::{DiseasePredictor, DISEASES};
pub use manager::{ModelSet, ModelStats};
pub use skin_type::{SkinTypePredictor, SKIN_TYPES};

#[cfg(test)]
pub(crate) mod testing {
    use super::backend::{InferenceModel, InputLayout};
    use crate::utils::error::AnalysisError;
    use crate::Result;
    use ndarray::{Array4, ArrayD, IxDyn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 返回固定输出的推理后端
    pub struct StubModel {
        name: String,
        layout: InputLayout,
        output: Vec<f32>,
        fail_after: Option<usize>,
        pub calls: AtomicUsize,
    }

    impl StubModel {
        pub fn new(name: &str, layout: InputLayout, output: Vec<f32>) -> Self {
            Self {
                name: name.to_string(),
                layout,
                output,
                fail_after: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(name: &str, layout: InputLayout) -> Self {
            Self::failing_after(name, layout, Vec::new(), 0)
        }

        /// 前 `successes` 次调用正常返回，之后全部失败
        pub fn failing_after(
            name: &str,
            layout: InputLayout,
            output: Vec<f32>,
            successes: usize,
        ) -> Self {
            Self {
                fail_after: Some(successes),
                ..Self::new(name, layout, output)
            }
        }
    }

    impl InferenceModel for StubModel {
        fn name(&self) -> &str {
            &self.name
        }

        fn input_layout(&self) -> InputLayout {
            self.layout
        }

        fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            let expected = self.layout.input_shape(224);
            if input.dim() != expected {
                return Err(AnalysisError::Inference(format!(
                    "{} got input {:?}",
                    self.name,
                    input.shape()
                )));
            }

            if self.fail_after.is_some_and(|n| call >= n) {
                return Err(AnalysisError::Inference(format!("{} is broken", self.name)));
            }

            Ok(ArrayD::from_shape_vec(IxDyn(&[1, self.output.len()]), self.output.clone())
                .expect("stub output shape"))
        }
    }
}
