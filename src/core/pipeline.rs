use crate::core::parser::IntentSpecParser;
use crate::core::translator::translate_narrative_to_spec;
use crate::domain::model::SpecBundle;
use crate::domain::ports::{LlmClient, Pipeline, Storage};
use crate::utils::error::{IntentError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const SPEC_FILE: &str = "jgtml_spec.json";
pub const PACKAGE_FILE: &str = "signal_package.zip";

#[derive(Debug, Clone)]
pub enum NarrativeSource {
    Inline(String),
    File(String),
}

/// narrative -> LLM spec -> 模擬解析 -> 寫出 spec 與訊號包
pub struct IntentPipeline<S: Storage, L: LlmClient> {
    storage: S,
    llm: L,
    source: NarrativeSource,
    parser: IntentSpecParser,
    output_path: String,
    translate_temperature: f32,
}

impl<S: Storage, L: LlmClient> IntentPipeline<S, L> {
    pub fn new(
        storage: S,
        llm: L,
        source: NarrativeSource,
        parser: IntentSpecParser,
        output_path: String,
        translate_temperature: f32,
    ) -> Self {
        Self {
            storage,
            llm,
            source,
            parser,
            output_path,
            translate_temperature,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, L: LlmClient> Pipeline for IntentPipeline<S, L> {
    async fn extract(&self) -> Result<String> {
        let narrative = match &self.source {
            NarrativeSource::Inline(text) => text.clone(),
            NarrativeSource::File(path) => {
                tracing::debug!("Reading narrative from: {}", path);
                std::fs::read_to_string(path)?
            }
        };

        let narrative = narrative.trim().to_string();
        if narrative.is_empty() {
            return Err(IntentError::ProcessingError {
                message: "Trader narrative is empty".to_string(),
            });
        }

        tracing::info!("📝 Narrative collected ({} chars)", narrative.len());
        Ok(narrative)
    }

    async fn transform(&self, narrative: String) -> Result<SpecBundle> {
        tracing::info!("🧠 Translating narrative to JGTML spec");
        let spec =
            translate_narrative_to_spec(&self.llm, &narrative, self.translate_temperature).await?;
        tracing::info!(
            "✅ Spec generated: {} signal(s), instruments [{}]",
            spec.signals.len(),
            spec.instruments.join(", ")
        );

        tracing::info!("🔍 Handing spec to the intent parser");
        let parsed = self.parser.parse(&spec).await?;

        Ok(SpecBundle {
            narrative,
            spec,
            parsed,
        })
    }

    async fn load(&self, bundle: SpecBundle) -> Result<String> {
        let spec_json = serde_json::to_string_pretty(&bundle.spec)?;
        let parsed_json = serde_json::to_string_pretty(&bundle.parsed)?;

        self.storage
            .write_file(SPEC_FILE, spec_json.as_bytes())
            .await?;

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("narrative.txt", FileOptions::default())?;
            zip.write_all(bundle.narrative.as_bytes())?;

            zip.start_file::<_, ()>(SPEC_FILE, FileOptions::default())?;
            zip.write_all(spec_json.as_bytes())?;

            zip.start_file::<_, ()>("parsed_output.json", FileOptions::default())?;
            zip.write_all(parsed_json.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing signal package ({} bytes)", zip_data.len());
        self.storage.write_file(PACKAGE_FILE, &zip_data).await?;

        Ok(format!("{}/{}", self.output_path, PACKAGE_FILE))
    }
}
