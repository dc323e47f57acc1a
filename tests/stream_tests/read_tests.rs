//! Tests for the read helpers
//!
//! These tests verify:
//! - Partial chunks accumulate into one read
//! - Short reads are decode faults only for `read_exact`
//! - No single request exceeds the chunk size

use bytes::Bytes;

use bytelang::serializer::{ByteVector, Serializer, U32};
use bytelang::stream::{read_exact, read_up_to, InputStream, READ_CHUNK};
use bytelang::{BridgeError, Result};

// =============================================================================
// Helper Streams
// =============================================================================

/// Hands out at most `per_call` bytes per call and records every request
struct Metered {
    data: Vec<u8>,
    per_call: usize,
    requests: Vec<usize>,
}

impl Metered {
    fn new(data: Vec<u8>, per_call: usize) -> Self {
        Self {
            data,
            per_call,
            requests: Vec::new(),
        }
    }
}

impl InputStream for Metered {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        self.requests.push(size);
        let n = size.min(self.per_call).min(self.data.len());
        Ok(Bytes::from(self.data.drain(..n).collect::<Vec<u8>>()))
    }
}

// =============================================================================
// Accumulation Tests
// =============================================================================

#[test]
fn test_read_exact_accumulates_partial_chunks() {
    let mut input = Metered::new(vec![1, 2, 3, 4], 1);
    let bytes = read_exact(&mut input, 3).unwrap();

    assert_eq!(&bytes[..], &[1, 2, 3]);
    assert_eq!(input.data, vec![4]);
    assert_eq!(input.requests, vec![3, 2, 1]);
}

#[test]
fn test_read_up_to_stops_when_dry() {
    let mut input = Metered::new(vec![7, 8], 1);
    let bytes = read_up_to(&mut input, 5).unwrap();
    assert_eq!(&bytes[..], &[7, 8]);
}

#[test]
fn test_read_up_to_zero() {
    let mut input: &[u8] = &[9];
    assert!(read_up_to(&mut input, 0).unwrap().is_empty());
    assert_eq!(input, &[9]);
}

#[test]
fn test_read_exact_short_is_decode_error() {
    let mut input: &[u8] = &[1, 2];
    let err = read_exact(&mut input, 4).unwrap_err();
    assert!(matches!(err, BridgeError::Decode { expected: 4, actual: 2 }));
}

// =============================================================================
// Chunking Tests
// =============================================================================

#[test]
fn test_large_read_is_requested_in_chunks() {
    let total = READ_CHUNK * 2 + 10;
    let mut input = Metered::new(vec![0x5A; total], usize::MAX);
    let bytes = read_exact(&mut input, total).unwrap();

    assert_eq!(bytes.len(), total);
    assert_eq!(input.requests, vec![READ_CHUNK, READ_CHUNK, 10]);
}

#[test]
fn test_bogus_length_prefix_requests_stay_bounded() {
    // Declares 16 MB, delivers 256 bytes
    let mut frame = (16u32 * 1024 * 1024).to_le_bytes().to_vec();
    frame.extend_from_slice(&[0xAB; 256]);
    let mut input = Metered::new(frame, 64);

    let err = ByteVector::new(U32).unpack(&mut input).unwrap_err();

    assert!(matches!(
        err,
        BridgeError::Decode {
            expected: 16_777_216,
            actual: 256
        }
    ));
    assert!(input.requests.iter().all(|&size| size <= READ_CHUNK));
}
