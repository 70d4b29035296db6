use crate::domain::model::{
    MarketStructure, MfiTrend, RawDataRow, SourceColumns, TimeframeDisplay,
    DEFAULT_INSTRUMENT_NAME, TIMEFRAMES_CONFIG,
};
use crate::utils::error::{IntentError, Result};
use csv::{ReaderBuilder, Trim};
use std::fmt;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MfiSignalAppearance<'a> {
    pub name: &'a str,
    pub glyph: &'static str,
}

/// 把上傳的 CSV 文字轉成 header -> 值 的資料列
pub fn parse_csv(text: &str) -> Result<Vec<RawDataRow>> {
    if text.is_empty() {
        return Err(csv_format("File content is empty."));
    }

    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(csv_format(
            "CSV must have at least a header and one data row.",
        ));
    }
    let cleaned = lines.join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(cleaned.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::with_capacity(lines.len() - 1);
    for record in reader.records() {
        let record = record?;
        let row: RawDataRow = headers
            .iter()
            .enumerate()
            .map(|(index, column)| {
                (
                    column.clone(),
                    record.get(index).unwrap_or_default().to_string(),
                )
            })
            .collect();
        rows.push(row);
    }

    tracing::debug!("Parsed {} CSV rows with {} columns", rows.len(), headers.len());
    Ok(rows)
}

pub fn mfi_trend(code: &str) -> MfiTrend {
    match code {
        "++" => MfiTrend::Bullish,
        "--" => MfiTrend::Bearish,
        // Fake 在圖上仍視為空頭
        "-+" => MfiTrend::Bearish,
        "+-" => MfiTrend::Neutral,
        _ => MfiTrend::NotAvailable,
    }
}

pub fn mfi_signal_appearance(code: &str) -> MfiSignalAppearance<'_> {
    match code {
        "++" => MfiSignalAppearance { name: "Green", glyph: "🌿" },
        "--" => MfiSignalAppearance { name: "Fade", glyph: "🍂" },
        "-+" => MfiSignalAppearance { name: "Fake", glyph: "🎭" },
        "+-" => MfiSignalAppearance { name: "Squat", glyph: "🌫" },
        NOT_AVAILABLE => MfiSignalAppearance { name: NOT_AVAILABLE, glyph: "❔" },
        other => MfiSignalAppearance { name: other, glyph: "◌" },
    }
}

pub fn instrument_from_file_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        DEFAULT_INSTRUMENT_NAME.to_string()
    } else {
        stem.to_uppercase()
    }
}

fn cell<'a>(row: &'a RawDataRow, key: &str) -> Option<&'a str> {
    row.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// 趨勢取自最後一根已完成 K 棒（倒數第二列），價格取自當前 K 棒（最後一列）
pub fn build_market_structure(rows: &[RawDataRow], file_name: &str) -> Result<MarketStructure> {
    let (completed, current) = match rows {
        [] => return Err(csv_format("CSV file has no data rows.")),
        [_] => {
            return Err(csv_format(
                "CSV needs at least two data rows: one for completed bar analysis and one for current bar data.",
            ))
        }
        [.., completed, current] => (completed, current),
    };

    let timeframes = TIMEFRAMES_CONFIG
        .iter()
        .map(|tf| {
            let mfi = cell(completed, tf.mfi_key).unwrap_or(NOT_AVAILABLE);
            let zcol = cell(completed, tf.zcol_key).unwrap_or(NOT_AVAILABLE);
            TimeframeDisplay {
                label: tf.label.to_string(),
                trend: mfi_trend(mfi),
                mfi: mfi.to_string(),
                zcol: zcol.to_string(),
            }
        })
        .collect();

    let last_close_price = cell(current, "Close")
        .or_else(|| cell(completed, "Close"))
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

    Ok(MarketStructure {
        instrument: instrument_from_file_name(file_name),
        last_close_price,
        timeframes,
        source_columns: SourceColumns {
            mfi: TIMEFRAMES_CONFIG.iter().map(|tf| tf.mfi_key.to_string()).collect(),
            zone: TIMEFRAMES_CONFIG.iter().map(|tf| tf.zcol_key.to_string()).collect(),
        },
    })
}

pub fn capitalize(value: &str) -> String {
    if value == NOT_AVAILABLE {
        return value.to_string();
    }
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn render_market_structure(data: &MarketStructure) -> String {
    MarketStructureView(data).to_string()
}

/// 終端機版的多時間框架結構圖
struct MarketStructureView<'a>(&'a MarketStructure);

impl fmt::Display for MarketStructureView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0;

        writeln!(f, "Instrument: {}", data.instrument)?;
        writeln!(f, "Last Close: {}", data.last_close_price)?;
        writeln!(f)?;

        writeln!(f, "SOURCE COLUMNS")?;
        writeln!(f, "  MFI:  {}", data.source_columns.mfi.join(", "))?;
        writeln!(f, "  Zone: {}", data.source_columns.zone.join(", "))?;
        writeln!(f)?;

        writeln!(f, "MFI Alignment")?;
        for tf in &data.timeframes {
            writeln!(f, "  {}: {}", tf.label, tf.trend)?;
        }
        writeln!(f, "Zone Summary")?;
        for tf in &data.timeframes {
            writeln!(f, "  {}: {}", tf.label, capitalize(&tf.zcol))?;
        }
        writeln!(f)?;

        if data.timeframes.is_empty() {
            return writeln!(f, "No data available for visualization.");
        }

        writeln!(f, "{:<18}{:<24}{}", "MFI ZONE TREND", "MFI SIGNAL", "ZONE COLOR")?;
        for (idx, tf) in data.timeframes.iter().enumerate() {
            let appearance = mfi_signal_appearance(&tf.mfi);
            let trend = format!("{} {}", tf.label, tf.trend);
            let signal = format!("{} {} {} {}", tf.label, tf.mfi, appearance.glyph, appearance.name);
            writeln!(
                f,
                "{:<18}{:<24}{} {}",
                trend,
                signal,
                tf.label,
                capitalize(&tf.zcol)
            )?;
            if idx + 1 < data.timeframes.len() {
                writeln!(f, "{:<18}{:<24}{}", "  ↓", "  ↓", "  ↓")?;
            }
        }
        Ok(())
    }
}

fn csv_format(message: &str) -> IntentError {
    IntentError::CsvFormat {
        message: message.to_string(),
    }
}
