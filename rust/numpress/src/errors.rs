use std::fmt;

/// Errors raised while turning a trace into numpress bytes.
#[derive(Debug)]
pub enum EncodingError {
    /// The mode only accepts values >= 0.
    NegativeValue { index: usize, value: f64 },
    NonFiniteValue { index: usize, value: f64 },
    /// The scaled value does not fit the integer width the mode writes.
    Overflow { index: usize, value: f64 },
    InvalidFixedPoint(f64),
    /// The requested linear mass accuracy needs a larger fixed point than
    /// the 32 bit residuals can hold for this trace.
    MassAccuracyUnreachable { mass_accuracy: f64, max_fixed_point: f64 },
    ToleranceExceeded {
        index: usize,
        original: f64,
        decoded: f64,
        tolerance: f64,
    },
    Compression(std::io::Error),
}

/// Errors raised while reading numpress bytes (or their base64 transport form).
#[derive(Debug)]
pub enum DecodingError {
    Base64(base64::DecodeError),
    Decompression(std::io::Error),
    /// The byte stream ended before the value being read was complete.
    Truncated { context: &'static str, len: usize },
    InvalidFixedPoint(f64),
    /// Short logarithmic float payloads are made of 2 byte values.
    OddLength { len: usize },
}

#[derive(Debug)]
pub enum NumpressError {
    InvalidMode { name: String },
    Encoding(EncodingError),
    Decoding(DecodingError),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeValue { index, value } => write!(
                f,
                "Cannot encode negative value {} at position {}",
                value, index
            ),
            Self::NonFiniteValue { index, value } => write!(
                f,
                "Cannot encode non-finite value {} at position {}",
                value, index
            ),
            Self::Overflow { index, value } => write!(
                f,
                "Value {} at position {} overflows the encoded integer range",
                value, index
            ),
            Self::InvalidFixedPoint(fp) => write!(
                f,
                "Fixed point must be finite and positive, got {}",
                fp
            ),
            Self::MassAccuracyUnreachable {
                mass_accuracy,
                max_fixed_point,
            } => write!(
                f,
                "Mass accuracy {} needs a fixed point above the maximum of {}",
                mass_accuracy, max_fixed_point
            ),
            Self::ToleranceExceeded {
                index,
                original,
                decoded,
                tolerance,
            } => write!(
                f,
                "Value {} at position {} decodes to {}, outside the tolerance of {}",
                original, index, decoded, tolerance
            ),
            Self::Compression(e) => write!(f, "zlib compression failed: {}", e),
        }
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(e) => write!(f, "Invalid base64 input: {}", e),
            Self::Decompression(e) => write!(f, "zlib decompression failed: {}", e),
            Self::Truncated { context, len } => write!(
                f,
                "Corrupt input data ({} bytes): not enough bytes to read {}",
                len, context
            ),
            Self::InvalidFixedPoint(fp) => write!(f, "Invalid fixed point in header: {}", fp),
            Self::OddLength { len } => write!(
                f,
                "Short logarithmic float payload has an odd length of {} bytes",
                len
            ),
        }
    }
}

impl fmt::Display for NumpressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMode { name } => write!(f, "Unknown numpress compression mode '{}'", name),
            Self::Encoding(e) => write!(f, "Encoding error: {}", e),
            Self::Decoding(e) => write!(f, "Decoding error: {}", e),
        }
    }
}

impl std::error::Error for EncodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compression(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for DecodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(e) => Some(e),
            Self::Decompression(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for NumpressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidMode { .. } => None,
            Self::Encoding(e) => Some(e),
            Self::Decoding(e) => Some(e),
        }
    }
}

impl From<EncodingError> for NumpressError {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e)
    }
}

impl From<DecodingError> for NumpressError {
    fn from(e: DecodingError) -> Self {
        Self::Decoding(e)
    }
}

impl From<base64::DecodeError> for DecodingError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

pub type Result<T> = std::result::Result<T, NumpressError>;
