use clap::{
    Parser,
    Subcommand,
};
use numpress::CompressionMode;
use rtnorm::OutlierMethod;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Numpress-encode named numeric traces.
    Encode(EncodeArgs),
    /// Decode numpress-encoded traces back to numbers.
    Decode(DecodeArgs),
    /// Remove outlier RT pairs and fit a linear RT transformation.
    Normalize(NormalizeArgs),
    /// Write template configuration files.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    Linear,
    PositiveInteger,
    ShortLogarithmicFloat,
}

impl From<ModeArg> for CompressionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Linear => CompressionMode::Linear,
            ModeArg::PositiveInteger => CompressionMode::PositiveInteger,
            ModeArg::ShortLogarithmicFloat => CompressionMode::ShortLogarithmicFloat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MethodArg {
    IterResidual,
    IterJackknife,
    Ransac,
    None,
}

impl From<MethodArg> for OutlierMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::IterResidual => OutlierMethod::IterResidual,
            MethodArg::IterJackknife => OutlierMethod::IterJackknife,
            MethodArg::Ransac => OutlierMethod::Ransac,
            MethodArg::None => OutlierMethod::None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum SerializationFormat {
    Json,
    #[default]
    PrettyJson,
}

#[derive(Parser, Debug, Clone)]
pub struct EncodeArgs {
    /// JSON object mapping trace names to arrays of numbers.
    #[arg(short, long)]
    pub input: PathBuf,

    /// The path to the json file with the numpress settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides the compression mode of the config file.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// zlib the numpress bytes before base64 encoding.
    #[arg(long)]
    pub zlib: bool,

    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(short, long, default_value_t, value_enum)]
    pub format: SerializationFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct DecodeArgs {
    /// JSON object mapping trace names to encoded traces, as written by `encode`.
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(short, long, default_value_t, value_enum)]
    pub format: SerializationFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct NormalizeArgs {
    /// CSV file with `x` (measured RT) and `y` (reference RT) columns.
    #[arg(short, long)]
    pub pairs: PathBuf,

    /// The path to the json file with the RT normalization settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    #[arg(long)]
    pub min_retained_fraction: Option<f64>,

    #[arg(long)]
    pub correlation_threshold: Option<f64>,

    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(short, long, default_value_t, value_enum)]
    pub format: SerializationFormat,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The directory to write the templates to.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
