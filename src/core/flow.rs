use crate::domain::model::SpecBundle;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

#[derive(Debug)]
pub struct FlowOutcome {
    pub output_path: String,
    pub bundle: SpecBundle,
}

/// 依序執行 extract -> transform -> load，任一步失敗即停止
pub struct FlowEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> FlowEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<FlowOutcome> {
        tracing::info!("🚀 Starting narrative-to-spec flow");

        tracing::info!("Step 1/3: collecting trader narrative");
        let narrative = self.pipeline.extract().await?;

        tracing::info!("Step 2/3: generating and parsing JGTML spec");
        let bundle = self.pipeline.transform(narrative).await?;

        tracing::info!("Step 3/3: saving spec and signal package");
        let output_path = self.pipeline.load(bundle.clone()).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(FlowOutcome {
            output_path,
            bundle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{JgtmlSpec, ParsedSpecOutput};
    use crate::utils::error::IntentError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPipeline {
        fail_transform: bool,
        steps: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        async fn extract(&self) -> Result<String> {
            self.steps.lock().unwrap().push("extract");
            Ok("narrative".to_string())
        }

        async fn transform(&self, narrative: String) -> Result<SpecBundle> {
            self.steps.lock().unwrap().push("transform");
            if self.fail_transform {
                return Err(IntentError::QuotaExceeded);
            }
            Ok(SpecBundle {
                narrative,
                spec: JgtmlSpec {
                    strategy_intent: "intent".to_string(),
                    instruments: vec![],
                    timeframes: vec![],
                    signals: vec![],
                },
                parsed: ParsedSpecOutput {
                    status: "Success".to_string(),
                    message: "ok".to_string(),
                    signal_package_preview: None,
                },
            })
        }

        async fn load(&self, _bundle: SpecBundle) -> Result<String> {
            self.steps.lock().unwrap().push("load");
            Ok("out/signal_package.zip".to_string())
        }
    }

    #[tokio::test]
    async fn test_runs_all_steps_in_order() {
        let engine = FlowEngine::new(RecordingPipeline::default());
        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome.output_path, "out/signal_package.zip");
        assert_eq!(outcome.bundle.narrative, "narrative");
        assert_eq!(
            *engine.pipeline.steps.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_error() {
        let engine = FlowEngine::new(RecordingPipeline {
            fail_transform: true,
            ..Default::default()
        });

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, IntentError::QuotaExceeded));
        assert_eq!(
            *engine.pipeline.steps.lock().unwrap(),
            vec!["extract", "transform"]
        );
    }
}
