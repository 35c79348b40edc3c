use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::algorithms::colorevol::ColorEvolutionReport;
use crate::algorithms::convert::FluxObservation;
use crate::config::PipelineConfig;
use crate::core::domain::{ObservationTable, RescaledTable};
use crate::parsing::table_parser;
use crate::preprocessing::pipeline::{PreprocessConfig, PreprocessPipeline};

/// Load and preprocess a light-curve file with the `[input]` settings of `config`
pub fn load_observations(path: &Path, config: &PipelineConfig) -> Result<ObservationTable> {
    let pipeline = PreprocessPipeline::with_config(PreprocessConfig::from(&config.input));
    let result = pipeline.process(path)?;
    log::info!(
        "Loaded {} observations in {} bands from {}",
        result.table.len(),
        result.table.bands().len(),
        path.display()
    );
    Ok(result.table)
}

/// GRB name used in artifact file names: the last `/` component, without the
/// file extension when derived from a path.
///
/// # Examples
///
/// ```
/// use grblc_rust::io::loaders::grb_name;
///
/// assert_eq!(grb_name("data/GRB050820A"), "GRB050820A");
/// assert_eq!(grb_name("GRB050820A"), "GRB050820A");
/// ```
pub fn grb_name(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

/// GRB name derived from a light-curve file path (`GRB050820A_magADS.txt` → `GRB050820A`).
pub fn grb_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.split_once('_') {
        Some((name, _)) if !name.is_empty() => name.to_string(),
        _ => stem,
    }
}

/// `<GRB>_rescaled_to_<band>.txt`
pub fn rescaled_file_name(grb: &str, reference_band: &str) -> String {
    format!("{}_rescaled_to_{}.txt", grb_name(grb), reference_band)
}

/// `<GRB>_converted_flux.txt`
pub fn converted_flux_file_name(grb: &str) -> String {
    format!("{}_converted_flux.txt", grb_name(grb))
}

/// `<GRB>_colorevol.txt`
pub fn colorevol_file_name(grb: &str) -> String {
    format!("{}_colorevol.txt", grb_name(grb))
}

/// Write the rescaled light curve, space-separated
///
/// # Returns
/// Path of the written file
pub fn save_rescaled(directory: &Path, grb: &str, table: &RescaledTable) -> Result<PathBuf> {
    let mut df = table_parser::rescaled_to_dataframe(table)
        .context("Failed to convert rescaled table to DataFrame")?;
    let path = directory.join(rescaled_file_name(grb, &table.reference_band));
    write_table(&mut df, &path, b' ')?;
    log::info!("Rescaled light curve written to {}", path.display());
    Ok(path)
}

/// Per-band diagnostics as a DataFrame, one row per non-reference band.
///
/// Values that were not computed are nulls.
pub fn colorevol_to_dataframe(report: &ColorEvolutionReport) -> Result<DataFrame> {
    let results: Vec<_> = report.results.values().collect();

    let df = df!(
        "band" => results.iter().map(|r| r.band.clone()).collect::<Vec<_>>(),
        "occur_band" => results.iter().map(|r| r.occurrence_count as u64).collect::<Vec<_>>(),
        "sample_count" => results.iter().map(|r| r.sample_count as u64).collect::<Vec<_>>(),
        "slope" => results.iter().map(|r| r.slope()).collect::<Vec<_>>(),
        "slope_err" => results.iter().map(|r| r.slope_err()).collect::<Vec<_>>(),
        "intercept" => results.iter().map(|r| r.intercept()).collect::<Vec<_>>(),
        "inter_err" => results.iter().map(|r| r.intercept_err()).collect::<Vec<_>>(),
        "red_chi2" => results.iter().map(|r| r.reduced_chi_square()).collect::<Vec<_>>(),
        "p_value" => results.iter().map(|r| r.fit.and_then(|f| f.p_value)).collect::<Vec<_>>(),
        "mean" => results.iter().map(|r| r.weighted_mean()).collect::<Vec<_>>(),
        "mean_err" => results.iter().map(|r| r.weighted_mean_err()).collect::<Vec<_>>(),
        "const_chi2" => results.iter().map(|r| r.constant.map(|c| c.chi_square)).collect::<Vec<_>>(),
        "const_red_chi2" => results.iter().map(|r| r.constant_reduced_chi_square()).collect::<Vec<_>>(),
        "const_p_value" => results.iter().map(|r| r.constant.and_then(|c| c.p_value)).collect::<Vec<_>>(),
        "comment" => results.iter().map(|r| r.classification.comment()).collect::<Vec<_>>(),
    )?;

    Ok(df)
}

/// Write a flux light curve (`time_sec, flux, flux_err, band`), tab-separated
pub fn save_converted_flux(directory: &Path, grb: &str, rows: &[FluxObservation]) -> Result<PathBuf> {
    let mut df = df!(
        "time_sec" => rows.iter().map(|r| r.time_sec).collect::<Vec<_>>(),
        "flux" => rows.iter().map(|r| r.flux).collect::<Vec<_>>(),
        "flux_err" => rows.iter().map(|r| r.flux_err).collect::<Vec<_>>(),
        "band" => rows.iter().map(|r| r.band.clone()).collect::<Vec<_>>(),
    )
    .context("Failed to build flux DataFrame")?;
    let path = directory.join(converted_flux_file_name(grb));
    write_table(&mut df, &path, b'\t')?;
    log::info!("Flux light curve written to {}", path.display());
    Ok(path)
}

/// Write the color-evolution diagnostics, tab-separated
pub fn save_color_evolution(
    directory: &Path,
    grb: &str,
    report: &ColorEvolutionReport,
) -> Result<PathBuf> {
    let mut df = colorevol_to_dataframe(report)?;
    let path = directory.join(colorevol_file_name(grb));
    write_table(&mut df, &path, b'\t')?;
    log::info!("Color-evolution diagnostics written to {}", path.display());
    Ok(path)
}

fn write_table(df: &mut DataFrame, path: &Path, separator: u8) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(separator)
        .finish(df)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
