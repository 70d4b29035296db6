use crate::domain::model::{JgtmlSpec, ParsedSpecOutput, SignalPackagePreview};
use crate::utils::error::{IntentError, Result};
use std::time::Duration;

pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(1000);

/// 下游 JGTML Python 流程的各階段，僅供提示下一步
pub const DOWNSTREAM_STAGES: [(&str, &str); 3] = [
    ("JGTIDS.py", "Raw indicator calculations"),
    ("JGTCDS.py", "Chaos Data file generation"),
    ("TideAlligatorAnalysis", "Alligator signal mapping"),
];

/// 模擬 spec 交給下游解析器的步驟
#[derive(Debug, Clone)]
pub struct IntentSpecParser {
    delay: Duration,
}

impl Default for IntentSpecParser {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

impl IntentSpecParser {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn parse(&self, spec: &JgtmlSpec) -> Result<ParsedSpecOutput> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if spec.strategy_intent.is_empty() {
            return Err(IntentError::SpecValidation {
                message: "Invalid JGTML spec provided for parsing. Core fields missing."
                    .to_string(),
            });
        }

        tracing::debug!(
            "Parsed spec with {} signal(s) across {} timeframe(s)",
            spec.signals.len(),
            spec.timeframes.len()
        );

        Ok(ParsedSpecOutput {
            status: "Success".to_string(),
            message: "JGTML spec successfully received and validated (simulation). Ready for signal processing.".to_string(),
            signal_package_preview: Some(SignalPackagePreview {
                strategy: spec.strategy_intent.clone(),
                instruments: spec.instruments.clone(),
                timeframes: spec.timeframes.clone(),
                signal_count: spec.signals.len(),
                first_signal_name: spec
                    .signals
                    .first()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "N/A".to_string()),
                unique_components: unique_component_keys(spec),
            }),
        })
    }
}

/// 所有訊號元件的類別鍵，依首次出現順序去重
fn unique_component_keys(spec: &JgtmlSpec) -> String {
    let mut keys: Vec<&str> = Vec::new();
    for component in spec.signals.iter().flat_map(|s| s.jgtml_components.iter()) {
        for key in component.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
    }

    if keys.is_empty() {
        "None".to_string()
    } else {
        keys.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::JgtmlSignal;
    use serde_json::json;

    fn component(key: &str, value: &str) -> crate::domain::model::JgtmlSignalComponent {
        let mut map = serde_json::Map::new();
        map.insert(key.to_string(), json!(value));
        map
    }

    fn sample_spec() -> JgtmlSpec {
        JgtmlSpec {
            strategy_intent: "Trend following for Wave 5".to_string(),
            instruments: vec!["EUR/USD".to_string()],
            timeframes: vec!["H4".to_string(), "H1".to_string()],
            signals: vec![
                JgtmlSignal {
                    name: "wave5_breakout".to_string(),
                    description: "Breakout above 1.0800".to_string(),
                    jgtml_components: vec![
                        component("alligator_state", "AlligatorAnalysis.mouth_opening"),
                        component("momentum", "jgtpy.ao_acceleration"),
                    ],
                    alligator_context: None,
                },
                JgtmlSignal {
                    name: "pullback_entry".to_string(),
                    description: "Wave 4 pullback".to_string(),
                    jgtml_components: vec![
                        component("momentum", "jgtpy.ao_acceleration"),
                        component("wave_count", "manual_wave_3_complete"),
                    ],
                    alligator_context: Some("Tide".to_string()),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_parse_builds_signal_package_preview() {
        let parser = IntentSpecParser::new(Duration::ZERO);
        let output = parser.parse(&sample_spec()).await.unwrap();

        assert_eq!(output.status, "Success");
        let preview = output.signal_package_preview.unwrap();
        assert_eq!(preview.signal_count, 2);
        assert_eq!(preview.first_signal_name, "wave5_breakout");
        assert_eq!(
            preview.unique_components,
            "alligator_state, momentum, wave_count"
        );
    }

    #[tokio::test]
    async fn test_parse_without_signals() {
        let mut spec = sample_spec();
        spec.signals.clear();

        let output = IntentSpecParser::new(Duration::ZERO)
            .parse(&spec)
            .await
            .unwrap();
        let preview = output.signal_package_preview.unwrap();

        assert_eq!(preview.signal_count, 0);
        assert_eq!(preview.first_signal_name, "N/A");
        assert_eq!(preview.unique_components, "None");
    }

    #[tokio::test]
    async fn test_parse_rejects_empty_strategy_intent() {
        let mut spec = sample_spec();
        spec.strategy_intent.clear();

        let err = IntentSpecParser::new(Duration::ZERO)
            .parse(&spec)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid JGTML spec provided for parsing. Core fields missing."
        );
    }

    #[tokio::test]
    async fn test_preview_serializes_camel_case() {
        let output = IntentSpecParser::new(Duration::ZERO)
            .parse(&sample_spec())
            .await
            .unwrap();
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["signalPackagePreview"]["signalCount"], 2);
        assert_eq!(
            json["signalPackagePreview"]["firstSignalName"],
            "wave5_breakout"
        );
    }
}
