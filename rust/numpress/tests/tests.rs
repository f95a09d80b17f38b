use numpress::{
    CompressionMode,
    DecodingError,
    EncodingError,
    NumpressConfig,
    NumpressError,
    decode,
    decode_bytes,
    encode,
    encode_bytes,
};
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;

const REFERENCE_TRACE: [f64; 4] = [100.0, 200.0, 300.00005, 400.0001];

fn encode_reference(mode: CompressionMode) -> String {
    encode(&REFERENCE_TRACE, &NumpressConfig::new(mode))
        .unwrap()
        .data
}

#[test]
fn test_reference_trace_linear() {
    let encoded = encode_reference(CompressionMode::Linear);
    assert_eq!(encoded, "QWR64UAAAADo//8/0P//f1kSgA==");
    assert_eq!(encoded.len(), 28);
}

#[test]
fn test_reference_trace_positive_integer() {
    // [100, 200, 300, 400] half-byte packed, no header
    let encoded = encode_reference(CompressionMode::PositiveInteger);
    assert_eq!(encoded, "ZGaMXCFQkQ==");
    assert_eq!(encoded.len(), 12);
}

#[test]
fn test_reference_trace_short_logarithmic_float() {
    // Header with fixed point 10933 plus four shorts
    let encoded = encode_reference(CompressionMode::ShortLogarithmicFloat);
    assert_eq!(encoded, "QMVagAAAAAAZxX3ivPP8/w==");
    assert_eq!(encoded.len(), 24);
}

#[test]
fn test_reference_strings_decode() {
    let linear = decode("QWR64UAAAADo//8/0P//f1kSgA==", CompressionMode::Linear, false).unwrap();
    assert_eq!(linear.len(), 4);
    for (a, b) in REFERENCE_TRACE.iter().zip(linear.iter()) {
        assert!((a - b).abs() < 1e-7, "{} vs {}", a, b);
    }

    let pic = decode("ZGaMXCFQkQ==", CompressionMode::PositiveInteger, false).unwrap();
    assert_eq!(pic, vec![100.0, 200.0, 300.0, 400.0]);

    let slof = decode(
        "QMVagAAAAAAZxX3ivPP8/w==",
        CompressionMode::ShortLogarithmicFloat,
        false,
    )
    .unwrap();
    assert_eq!(slof.len(), 4);
    for (a, b) in REFERENCE_TRACE.iter().zip(slof.iter()) {
        assert!((a - b).abs() < 1e-2, "{} vs {}", a, b);
    }
}

#[test]
fn test_encoding_is_deterministic() {
    for mode in CompressionMode::ALL {
        assert_eq!(encode_reference(mode), encode_reference(mode));
    }
}

#[test]
fn test_random_mz_arrays_linear() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for len in [3, 10, 257, 1000] {
        let mut values: Vec<f64> = (0..len).map(|_| rng.gen_range(100.0..2000.0)).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for zlib in [false, true] {
            let config = NumpressConfig::new(CompressionMode::Linear).with_secondary_compression(zlib);
            let encoded = encode(&values, &config).unwrap();
            assert!(encoded.fixed_point_estimated);
            let decoded = encoded.decode().unwrap();
            assert_eq!(decoded.len(), values.len());
            for (a, b) in values.iter().zip(decoded.iter()) {
                assert!((a - b).abs() <= 1e-7 * a, "{} vs {}", a, b);
            }
        }
    }
}

#[test]
fn test_random_intensities() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let values: Vec<f64> = (0..500)
        .map(|i| if i % 50 == 0 { 0.0 } else { rng.gen_range(0.0..1e6) })
        .collect();

    for zlib in [false, true] {
        let config = NumpressConfig::new(CompressionMode::PositiveInteger).with_secondary_compression(zlib);
        let pic = encode(&values, &config).unwrap();
        assert_eq!(pic.secondary_compression, zlib);
        let decoded = pic.decode().unwrap();
        assert_eq!(decoded.len(), values.len());
        for (a, b) in values.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 0.5);
        }

        let config =
            NumpressConfig::new(CompressionMode::ShortLogarithmicFloat).with_secondary_compression(zlib);
        let slof = encode(&values, &config).unwrap();
        assert_eq!(slof.secondary_compression, zlib);
        let decoded = slof.decode().unwrap();
        assert_eq!(decoded.len(), values.len());
        for (a, b) in values.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 1e-2 * a.max(1.0), "{} vs {}", a, b);
        }
    }
}

fn assert_linear_round_trip(values: &[f64], zlib: bool) {
    let config = NumpressConfig::new(CompressionMode::Linear).with_secondary_compression(zlib);
    let encoded = encode(values, &config).unwrap();
    let fixed_point = encoded.fixed_point.unwrap();
    let decoded = encoded.decode().unwrap();
    assert_eq!(decoded.len(), values.len());
    for (a, b) in values.iter().zip(decoded.iter()) {
        // Rounding to the fixed point grid is the only source of error
        assert!((a - b).abs() <= 0.5 / fixed_point + 1e-9, "{} vs {}", a, b);
    }
}

#[test]
fn test_linear_negative_and_mixed_sign() {
    for values in [
        vec![-1.0, 0.0, 1.0],
        vec![10.0, -2.0, 3.0],
        vec![-5.5, -3.25, -1.0, 1.5],
        vec![-250.0],
        vec![-0.5, -1200.75],
    ] {
        for zlib in [false, true] {
            assert_linear_round_trip(&values, zlib);
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut current = -100.0;
    let mut walk = vec![current];
    for _ in 0..299 {
        current += rng.gen_range(-25.0..25.0);
        walk.push(current);
    }
    assert_linear_round_trip(&walk, false);
}

#[test]
fn test_negative_values_rejected() {
    for mode in [
        CompressionMode::PositiveInteger,
        CompressionMode::ShortLogarithmicFloat,
    ] {
        let err = encode(&[-1.0], &NumpressConfig::new(mode)).unwrap_err();
        assert!(matches!(
            err,
            NumpressError::Encoding(EncodingError::NegativeValue { index: 0, .. })
        ));
    }
}

#[test]
fn test_single_and_double_values() {
    for values in [vec![42.125], vec![42.125, 17.0]] {
        for mode in CompressionMode::ALL {
            let encoded = encode(&values, &NumpressConfig::new(mode)).unwrap();
            let decoded = encoded.decode().unwrap();
            assert_eq!(decoded.len(), values.len());
            for (a, b) in values.iter().zip(decoded.iter()) {
                assert!((a - b).abs() <= 0.5);
            }
        }
    }
}

#[test]
fn test_secondary_compression_must_match() {
    let encoded = encode(&REFERENCE_TRACE, &NumpressConfig::new(CompressionMode::Linear)).unwrap();
    let err = decode(&encoded.data, CompressionMode::Linear, true).unwrap_err();
    assert!(matches!(
        err,
        NumpressError::Decoding(DecodingError::Decompression(_))
    ));
}

#[test]
fn test_malformed_input() {
    let err = decode("not base64!", CompressionMode::Linear, false).unwrap_err();
    assert!(matches!(err, NumpressError::Decoding(DecodingError::Base64(_))));

    // Only 6 bytes, the header alone needs 8
    let err = decode("QWR64UAA", CompressionMode::Linear, false).unwrap_err();
    assert!(matches!(
        err,
        NumpressError::Decoding(DecodingError::Truncated { .. })
    ));

    // Header followed by 3 bytes of a 4 byte integer
    let err = decode_bytes(
        &[0x41, 0x64, 0x7A, 0xE1, 0x40, 0, 0, 0, 0xE8, 0xFF, 0xFF],
        CompressionMode::Linear,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        NumpressError::Decoding(DecodingError::Truncated { .. })
    ));

    // Head nibble 6 announces two nibbles, only one follows
    let err = decode_bytes(&[0x64], CompressionMode::PositiveInteger).unwrap_err();
    assert!(matches!(
        err,
        NumpressError::Decoding(DecodingError::Truncated { .. })
    ));
}

#[test]
fn test_byte_api() {
    let bytes = encode_bytes(&REFERENCE_TRACE, CompressionMode::ShortLogarithmicFloat, 10933.0).unwrap();
    assert_eq!(bytes.len(), 8 + 2 * REFERENCE_TRACE.len());
    let decoded = decode_bytes(&bytes, CompressionMode::ShortLogarithmicFloat).unwrap();
    assert_eq!(decoded.len(), REFERENCE_TRACE.len());

    // Positive integer ignores the fixed point entirely
    let bytes = encode_bytes(&REFERENCE_TRACE, CompressionMode::PositiveInteger, f64::NAN).unwrap();
    assert_eq!(bytes, vec![0x64, 0x66, 0x8C, 0x5C, 0x21, 0x50, 0x91]);

    let err = encode_bytes(&REFERENCE_TRACE, CompressionMode::Linear, 0.0).unwrap_err();
    assert!(matches!(
        err,
        NumpressError::Encoding(EncodingError::InvalidFixedPoint(_))
    ));
}

#[test]
fn test_linear_mass_accuracy() {
    let mut config = NumpressConfig::new(CompressionMode::Linear);
    config.linear_mass_accuracy = Some(1e-4);
    let encoded = encode(&REFERENCE_TRACE, &config).unwrap();
    assert_eq!(encoded.fixed_point, Some(0.5 / 1e-4));
    for (a, b) in REFERENCE_TRACE.iter().zip(encoded.decode().unwrap().iter()) {
        assert!((a - b).abs() <= 1e-4);
    }

    config.linear_mass_accuracy = Some(1e-9);
    let err = encode(&REFERENCE_TRACE, &config).unwrap_err();
    assert!(matches!(
        err,
        NumpressError::Encoding(EncodingError::MassAccuracyUnreachable { .. })
    ));
}

#[test]
fn test_encoded_trace_json() {
    let config = NumpressConfig::new(CompressionMode::ShortLogarithmicFloat).with_secondary_compression(true);
    let encoded = encode(&REFERENCE_TRACE, &config).unwrap();
    let json = serde_json::to_string(&encoded).unwrap();
    assert!(json.contains("\"mode\":\"short_logarithmic_float\""));
    let back: numpress::EncodedTrace = serde_json::from_str(&json).unwrap();
    assert_eq!(back, encoded);
    assert_eq!(back.decode().unwrap().len(), 4);
}
