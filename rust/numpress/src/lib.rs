//! MS-Numpress compression of numeric traces.
//!
//! Three lossy modes are available:
//!
//! - [`CompressionMode::Linear`]: residuals of a linear prediction, about
//!   1e-7 relative error. Made for m/z and retention time arrays.
//! - [`CompressionMode::PositiveInteger`]: values rounded to the nearest
//!   non-negative integer, half-byte packed.
//! - [`CompressionMode::ShortLogarithmicFloat`]: `ln(x + 1)` in two bytes,
//!   about 1e-2 error. Made for intensities.
//!
//! The bytes are optionally zlib compressed and then base64 encoded, the
//! same transport form mzML uses for binary arrays.
//!
//! ```
//! use numpress::{decode, encode, CompressionMode, NumpressConfig};
//!
//! let intensities = [0.0, 1523.2, 88.0, 17.5];
//! let config = NumpressConfig::new(CompressionMode::ShortLogarithmicFloat)
//!     .with_secondary_compression(true);
//! let encoded = encode(&intensities, &config).unwrap();
//! let decoded = decode(&encoded.data, encoded.mode, true).unwrap();
//! for (a, b) in intensities.iter().zip(decoded.iter()) {
//!     assert!((a - b).abs() <= 1e-2 * a.max(1.0));
//! }
//! ```

mod coder;
mod config;
mod errors;
pub mod fixed_point;
mod halfbyte;
mod linear;
mod pic;
mod slof;

pub use coder::{
    EncodedTrace,
    decode,
    decode_bytes,
    encode,
    encode_bytes,
};
pub use config::{
    CompressionMode,
    NumpressConfig,
};
pub use errors::{
    DecodingError,
    EncodingError,
    NumpressError,
    Result,
};
