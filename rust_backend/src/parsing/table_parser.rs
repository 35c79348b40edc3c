use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

use crate::core::domain::{Observation, RescaledTable};
use crate::core::error::ColorEvolError;

/// Columns every light-curve table must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["time_sec", "mag", "mag_err", "band"];

/// Passthrough metadata columns; missing ones are read as empty strings.
pub const METADATA_COLUMNS: [&str; 4] = ["system", "telescope", "extcorr", "source"];

/// Field separator of a light-curve text table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Tab,
    /// Any run of spaces and/or tabs.
    #[default]
    Whitespace,
    Comma,
}

impl Delimiter {
    fn separator(&self) -> u8 {
        match self {
            Delimiter::Tab | Delimiter::Whitespace => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

impl std::str::FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tab" | "\\t" => Ok(Delimiter::Tab),
            "whitespace" | "space" | " " => Ok(Delimiter::Whitespace),
            "comma" | "," => Ok(Delimiter::Comma),
            other => Err(format!(
                "Unknown delimiter '{}'. Use 'tab', 'whitespace' or 'comma'",
                other
            )),
        }
    }
}

/// Parse a light-curve file into a Polars DataFrame
pub fn parse_lightcurve_table(path: &Path, delimiter: Delimiter) -> Result<DataFrame> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read light-curve file {}", path.display()))?;
    parse_lightcurve_str(&content, delimiter)
        .with_context(|| format!("Failed to parse light-curve file {}", path.display()))
}

/// Parse light-curve text (header row + data rows) into a Polars DataFrame
pub fn parse_lightcurve_str(content: &str, delimiter: Delimiter) -> Result<DataFrame> {
    let normalized = match delimiter {
        Delimiter::Whitespace => collapse_whitespace(content),
        _ => content.to_string(),
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter.separator())
                .with_truncate_ragged_lines(true),
        )
        .into_reader_with_file_handle(Cursor::new(normalized.into_bytes()))
        .finish()
        .context("Failed to parse light-curve table into DataFrame")?;

    for column in REQUIRED_COLUMNS {
        if df.column(column).is_err() {
            return Err(ColorEvolError::Parse(format!("Missing required column '{}'", column)).into());
        }
    }

    Ok(df)
}

/// Rewrite whitespace-delimited rows as tab-delimited ones, keeping quoted
/// fields intact.
fn collapse_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut has_field = false;
        for ch in line.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                    has_field = true;
                }
                c if c.is_whitespace() && !in_quotes => {
                    if has_field {
                        fields.push(std::mem::take(&mut current));
                        has_field = false;
                    }
                }
                c => {
                    current.push(c);
                    has_field = true;
                }
            }
        }
        if has_field {
            fields.push(current);
        }
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}

/// Convert a Polars DataFrame to Observation records
///
/// `band_normalized` is initialised to the raw band label; band
/// approximation happens during preprocessing.
pub fn dataframe_to_observations(df: &DataFrame) -> Result<Vec<Observation>> {
    let height = df.height();

    let times = float_column(df, "time_sec")?;
    let mags = float_column(df, "mag")?;
    let errs = float_column(df, "mag_err")?;
    let bands = string_column(df, "band")?;

    let mut metadata = Vec::with_capacity(METADATA_COLUMNS.len());
    for name in METADATA_COLUMNS {
        metadata.push(optional_string_column(df, name)?);
    }
    let flags = optional_string_column(df, "flag")?;

    let times = times.f64()?;
    let mags = mags.f64()?;
    let errs = errs.f64()?;
    let bands = bands.str()?;

    let mut observations = Vec::with_capacity(height);
    for i in 0..height {
        let time_sec = times
            .get(i)
            .with_context(|| format!("Missing time_sec at row {}", i))?;
        let magnitude = mags
            .get(i)
            .with_context(|| format!("Missing mag at row {}", i))?;
        let magnitude_err = errs
            .get(i)
            .with_context(|| format!("Missing mag_err at row {}", i))?;
        let band = bands
            .get(i)
            .with_context(|| format!("Missing band at row {}", i))?;

        let meta: Vec<String> = metadata
            .iter()
            .map(|col| cell_string(col.as_ref(), i))
            .collect::<Result<_>>()?;

        let flag = cell_string(flags.as_ref(), i)?;

        let mut obs = Observation::new(time_sec, magnitude, magnitude_err, band.trim())
            .with_metadata(meta[0].clone(), meta[1].clone(), meta[2].clone(), meta[3].clone());
        if !flag.is_empty() {
            obs = obs.with_flag(flag);
        }
        observations.push(obs);
    }

    Ok(observations)
}

/// Convert Observation records to a Polars DataFrame (input column layout)
pub fn observations_to_dataframe(observations: &[Observation]) -> Result<DataFrame> {
    let n = observations.len();

    let mut times = Vec::with_capacity(n);
    let mut mags = Vec::with_capacity(n);
    let mut errs = Vec::with_capacity(n);
    let mut bands = Vec::with_capacity(n);
    let mut bands_appx = Vec::with_capacity(n);
    let mut systems = Vec::with_capacity(n);
    let mut telescopes = Vec::with_capacity(n);
    let mut extcorrs = Vec::with_capacity(n);
    let mut sources = Vec::with_capacity(n);
    let mut flags = Vec::with_capacity(n);

    for obs in observations {
        times.push(obs.time_sec);
        mags.push(obs.magnitude);
        errs.push(obs.magnitude_err);
        bands.push(obs.band.clone());
        bands_appx.push(obs.band_normalized.clone());
        systems.push(obs.system.clone());
        telescopes.push(obs.telescope.clone());
        extcorrs.push(obs.extcorr.clone());
        sources.push(obs.source.clone());
        flags.push(obs.quality_flag.clone().unwrap_or_default());
    }

    let df = df!(
        "time_sec" => times,
        "mag" => mags,
        "mag_err" => errs,
        "band" => bands,
        "band_appx" => bands_appx,
        "system" => systems,
        "telescope" => telescopes,
        "extcorr" => extcorrs,
        "source" => sources,
        "flag" => flags,
    )?;

    Ok(df)
}

/// Convert a RescaledTable to a Polars DataFrame in the export column layout:
/// `time_sec, mag_rescaled_to_<band>, mag_err, band_original, system,
/// telescope, extcorr, source, flag`.
pub fn rescaled_to_dataframe(table: &RescaledTable) -> Result<DataFrame> {
    let n = table.rows.len();
    let rescaled_name = table.rescaled_column_name();

    let mut times = Vec::with_capacity(n);
    let mut mags = Vec::with_capacity(n);
    let mut errs = Vec::with_capacity(n);
    let mut bands = Vec::with_capacity(n);
    let mut systems = Vec::with_capacity(n);
    let mut telescopes = Vec::with_capacity(n);
    let mut extcorrs = Vec::with_capacity(n);
    let mut sources = Vec::with_capacity(n);
    let mut flags = Vec::with_capacity(n);

    for row in &table.rows {
        let obs = &row.observation;
        times.push(obs.time_sec);
        mags.push(row.rescaled_magnitude);
        errs.push(row.rescaled_magnitude_err);
        bands.push(obs.band.clone());
        systems.push(obs.system.clone());
        telescopes.push(obs.telescope.clone());
        extcorrs.push(obs.extcorr.clone());
        sources.push(obs.source.clone());
        flags.push(obs.quality_flag.clone().unwrap_or_default());
    }

    let df = df!(
        "time_sec" => times,
        rescaled_name.as_str() => mags,
        "mag_err" => errs,
        "band_original" => bands,
        "system" => systems,
        "telescope" => telescopes,
        "extcorr" => extcorrs,
        "source" => sources,
        "flag" => flags,
    )?;

    Ok(df)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Column> {
    let column = df
        .column(name)
        .map_err(|_| ColorEvolError::Parse(format!("Missing required column '{}'", name)))?;
    column
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Column> {
    let column = df
        .column(name)
        .map_err(|_| ColorEvolError::Parse(format!("Missing required column '{}'", name)))?;
    Ok(column.cast(&DataType::String)?)
}

fn optional_string_column(df: &DataFrame, name: &str) -> Result<Option<Column>> {
    match df.column(name) {
        Ok(column) => Ok(Some(column.cast(&DataType::String)?)),
        Err(_) => Ok(None),
    }
}

fn cell_string(column: Option<&Column>, row: usize) -> Result<String> {
    match column {
        Some(col) => Ok(col
            .str()?
            .get(row)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()),
        None => Ok(String::new()),
    }
}
