use numpress::{
    EncodedTrace,
    NumpressConfig,
};
use rayon::prelude::*;
use rtnorm::{
    Point,
    RtNormalizationConfig,
    fit_robust,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    DecodeArgs,
    EncodeArgs,
    NormalizeArgs,
    SerializationFormat,
    WriteTemplateArgs,
};
use crate::error::CliError;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T, format: SerializationFormat) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    match format {
        SerializationFormat::Json => serde_json::to_writer(writer, value)?,
        SerializationFormat::PrettyJson => serde_json::to_writer_pretty(writer, value)?,
    }
    info!("Wrote {}", path.display());
    Ok(())
}

/// Reads `x,y` rows into pairs, surrounding whitespace is ignored.
pub fn read_pairs(path: &Path) -> Result<Vec<Point>, CliError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let pairs = rdr.deserialize().collect::<Result<Vec<Point>, _>>()?;
    Ok(pairs)
}

fn numpress_config(args: &EncodeArgs) -> Result<NumpressConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => read_json(path)?,
        None => NumpressConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if args.zlib {
        config.apply_secondary_compression = true;
    }
    Ok(config)
}

fn normalization_config(args: &NormalizeArgs) -> Result<RtNormalizationConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => read_json(path)?,
        None => RtNormalizationConfig::default(),
    };
    if let Some(method) = args.method {
        config.outlier_method = method.into();
    }
    if let Some(fraction) = args.min_retained_fraction {
        config.min_retained_fraction = fraction;
    }
    if let Some(threshold) = args.correlation_threshold {
        config.correlation_threshold = threshold;
    }
    Ok(config)
}

/// Main function for the 'encode' subcommand.
#[instrument]
pub fn main_encode(args: EncodeArgs) -> Result<(), CliError> {
    let config = numpress_config(&args)?;
    info!("Using numpress config: {:#?}", config);

    let traces: BTreeMap<String, Vec<f64>> = read_json(&args.input)?;
    info!("Encoding {} traces", traces.len());

    let encoded = traces
        .par_iter()
        .map(|(name, values)| match numpress::encode(values, &config) {
            Ok(trace) => Ok((name.clone(), trace)),
            Err(source) => Err(CliError::Trace {
                name: name.clone(),
                source,
            }),
        })
        .collect::<Result<BTreeMap<String, EncodedTrace>, CliError>>()?;

    let raw_values: usize = traces.values().map(|v| v.len()).sum();
    let encoded_chars: usize = encoded.values().map(|t| t.data.len()).sum();
    info!(
        "Encoded {} values into {} base64 characters",
        raw_values, encoded_chars
    );
    write_json(&args.output, &encoded, args.format)
}

/// Main function for the 'decode' subcommand.
#[instrument]
pub fn main_decode(args: DecodeArgs) -> Result<(), CliError> {
    let encoded: BTreeMap<String, EncodedTrace> = read_json(&args.input)?;
    info!("Decoding {} traces", encoded.len());

    let decoded = encoded
        .par_iter()
        .map(|(name, trace)| match trace.decode() {
            Ok(values) => Ok((name.clone(), values)),
            Err(source) => Err(CliError::Trace {
                name: name.clone(),
                source,
            }),
        })
        .collect::<Result<BTreeMap<String, Vec<f64>>, CliError>>()?;

    write_json(&args.output, &decoded, args.format)
}

/// Main function for the 'normalize' subcommand.
#[instrument]
pub fn main_normalize(args: NormalizeArgs) -> Result<(), CliError> {
    let config = normalization_config(&args)?;
    info!("Using RT normalization config: {:#?}", config);

    let pairs = read_pairs(&args.pairs)?;
    info!("Loaded {} RT pairs from {}", pairs.len(), args.pairs.display());

    let fit = fit_robust(&pairs, &config)?;
    info!(
        "Kept {} pairs, rmse on kept pairs: {:.4}",
        fit.kept.len(),
        fit.rmse(&fit.kept)
    );
    write_json(&args.output, &fit, args.format)
}

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let numpress_path = target_dir.join("numpress_config.json");
    std::fs::write(
        &numpress_path,
        serde_json::to_string_pretty(&NumpressConfig::default())?,
    )?;

    let rt_path = target_dir.join("rt_normalization_config.json");
    std::fs::write(
        &rt_path,
        serde_json::to_string_pretty(&RtNormalizationConfig::default())?,
    )?;
    println!(
        "Wrote config templates to:\n- {}\n- {}",
        numpress_path.display(),
        rt_path.display()
    );
    Ok(())
}
