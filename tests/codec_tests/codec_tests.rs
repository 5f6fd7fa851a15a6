//! Tests for the row codec and key scheme
//!
//! These tests verify:
//! - Row encoding size and byte layout per byte order
//! - Bit-exact float decoding (NaN payloads, signed zero, extremes)
//! - Length and type mismatch errors
//! - Row keys sort in index order and never collide with reserved keys

use dbarray::codec::{decode, encode, row_size};
use dbarray::dtype::{ByteOrder, DType, Kind};
use dbarray::keys::{
    attr_key, metadata_keys, parse_attr_key, parse_row_key, row_key, ATTR_PREFIX, META_PREFIX,
    ROW_KEY_SIZE, ROW_PREFIX,
};
use dbarray::ArrayError;

// =============================================================================
// Encode Tests
// =============================================================================

#[test]
fn test_encode_size() {
    let dtype = DType::of::<f64>();
    let bytes = encode(&[1.0f64, 2.0, 3.0], 3, dtype).unwrap();

    assert_eq!(bytes.len(), 24);
    assert_eq!(bytes.len(), row_size(3, dtype).unwrap());
}

#[test]
fn test_encode_little_endian_layout() {
    let bytes = encode(&[0x0102_0304u32], 1, DType::of::<u32>()).unwrap();
    assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_encode_big_endian_layout() {
    let dtype = DType::describe(Kind::Int, 2, ByteOrder::Big).unwrap();
    let bytes = encode(&[0x0102i16, -1], 2, dtype).unwrap();
    assert_eq!(bytes, vec![0x01, 0x02, 0xff, 0xff]);
}

#[test]
fn test_encode_length_mismatch() {
    let result = encode(&[1i32, 2, 3], 4, DType::of::<i32>());
    assert!(matches!(result, Err(ArrayError::Codec(_))));

    let result = encode::<i32>(&[], 1, DType::of::<i32>());
    assert!(matches!(result, Err(ArrayError::Codec(_))));
}

#[test]
fn test_encode_type_mismatch() {
    // f64 values against a float32 dtype
    let result = encode(&[1.0f64], 1, DType::of::<f32>());
    assert!(matches!(result, Err(ArrayError::Codec(_))));

    // Same width, different kind
    let result = encode(&[1u32], 1, DType::of::<i32>());
    assert!(matches!(result, Err(ArrayError::Codec(_))));
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_inverts_encode_both_orders() {
    let values = [i64::MIN, -1, 0, 1, i64::MAX];
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let dtype = DType::of_with_order::<i64>(order);
        let bytes = encode(&values, values.len(), dtype).unwrap();
        let decoded: Vec<i64> = decode(&bytes, values.len(), dtype).unwrap();
        assert_eq!(decoded, values);
    }
}

#[test]
fn test_decode_is_bit_exact_for_floats() {
    let nan_with_payload = f32::from_bits(0x7fc0_1234);
    let values = [
        nan_with_payload,
        -0.0f32,
        f32::MIN_POSITIVE,
        f32::MAX,
        f32::NEG_INFINITY,
        f32::from_bits(1),
    ];

    for order in [ByteOrder::Little, ByteOrder::Big] {
        let dtype = DType::of_with_order::<f32>(order);
        let bytes = encode(&values, values.len(), dtype).unwrap();
        let decoded: Vec<f32> = decode(&bytes, values.len(), dtype).unwrap();

        let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        let actual: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_decode_wrong_size() {
    let dtype = DType::of::<u16>();

    let result = decode::<u16>(&[1, 2, 3], 2, dtype);
    assert!(matches!(result, Err(ArrayError::Codec(_))));

    let result = decode::<u16>(&[1, 2, 3, 4, 5, 6], 2, dtype);
    assert!(matches!(result, Err(ArrayError::Codec(_))));
}

#[test]
fn test_row_size_overflow() {
    let dtype = DType::of::<f64>();

    assert!(matches!(row_size(usize::MAX, dtype), Err(ArrayError::Codec(_))));
    assert!(matches!(
        decode::<f64>(&[0u8; 8], usize::MAX / 2, dtype),
        Err(ArrayError::Codec(_))
    ));
}

#[test]
fn test_decode_type_mismatch() {
    let bytes = encode(&[7u8, 8], 2, DType::of::<u8>()).unwrap();
    let result = decode::<i8>(&bytes, 2, DType::of::<u8>());
    assert!(matches!(result, Err(ArrayError::Codec(_))));
}

// =============================================================================
// Key Scheme Tests
// =============================================================================

#[test]
fn test_row_key_layout() {
    let key = row_key(258);

    assert_eq!(key.len(), ROW_KEY_SIZE);
    assert_eq!(key[0], ROW_PREFIX);
    assert_eq!(&key[1..], &[0, 0, 0, 0, 0, 0, 1, 2]);
}

#[test]
fn test_row_key_order_matches_index_order() {
    // Decimal string keys would sort "10" before "2"
    assert!(row_key(10) > row_key(2));

    let indices = [0u64, 1, 2, 9, 10, 11, 255, 256, 65_535, 65_536, u64::MAX - 1, u64::MAX];
    for pair in indices.windows(2) {
        assert!(
            row_key(pair[0]) < row_key(pair[1]),
            "key({}) should sort before key({})",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_parse_row_key() {
    for index in [0u64, 2, 10, 1 << 40, u64::MAX] {
        assert_eq!(parse_row_key(&row_key(index)), Some(index));
    }

    let (shape_key, dtype_key) = metadata_keys();
    assert_eq!(parse_row_key(shape_key), None);
    assert_eq!(parse_row_key(dtype_key), None);
    assert_eq!(parse_row_key(&row_key(5)[..8]), None);
}

#[test]
fn test_metadata_keys_disjoint_from_row_keys() {
    let (shape_key, dtype_key) = metadata_keys();

    assert_ne!(shape_key, dtype_key);
    assert_eq!(shape_key[0], META_PREFIX);
    assert_eq!(dtype_key[0], META_PREFIX);
    assert_ne!(META_PREFIX, ROW_PREFIX);

    for index in [0u64, 1, u64::MAX] {
        let key = row_key(index);
        assert_ne!(&key[..], shape_key);
        assert_ne!(&key[..], dtype_key);
    }
}

#[test]
fn test_attr_keys() {
    let key = attr_key("data_mean");

    assert_eq!(key[0], ATTR_PREFIX);
    assert_eq!(parse_attr_key(&key), Some("data_mean"));
    assert_eq!(parse_attr_key(&row_key(1)), None);
    assert_eq!(parse_row_key(&key), None);
}
