//! Tests for protocol dispatch
//!
//! These tests verify:
//! - One poll dispatches exactly one message
//! - Exact consumption of opcode + payload
//! - Silent drop of short reads and unknown opcodes
//! - Decode faults propagate to the caller
//! - Senders write opcode + payload, including across threads

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use parking_lot::Mutex;

use bytelang::serializer::{ByteVector, Struct, Void, U16, U32, U8};
use bytelang::stream::{shared_output, MemoryStream};
use bytelang::{PollOutcome, Protocol};

// =============================================================================
// Helper Functions
// =============================================================================

/// Handler that records every value it receives
fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |value: T| sink.lock().push(value))
}

fn u8_protocol() -> (MemoryStream, bytelang::ProtocolBuilder) {
    let stream = MemoryStream::new();
    let builder = Protocol::builder(stream.clone(), shared_output(stream.clone()), U8, U8);
    (stream, builder)
}

// =============================================================================
// Dispatch Scenarios
// =============================================================================

#[test]
fn test_u32_receiver_gets_42() {
    let (stream, mut builder) = u8_protocol();
    let (seen, handler) = recorder::<u32>();
    builder.add_receiver(U32, handler, None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x00, 0x2A, 0x00, 0x00, 0x00]);
    let outcome = protocol.poll().unwrap();

    assert_eq!(outcome, PollOutcome::Dispatched { code: Bytes::from_static(&[0x00]) });
    assert_eq!(*seen.lock(), vec![42]);
    assert_eq!(stream.remaining(), 0);
}

#[test]
fn test_byte_vector_receiver_gets_abc() {
    let (stream, mut builder) = u8_protocol();
    let (seen, handler) = recorder::<Bytes>();
    builder.add_receiver(ByteVector::new(U16), handler, None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x00, 0x03, 0x00, 0x41, 0x42, 0x43]);
    protocol.poll().unwrap();

    assert_eq!(*seen.lock(), vec![Bytes::from_static(b"ABC")]);
}

#[test]
fn test_void_sender_writes_opcode_only() {
    let (stream, mut builder) = u8_protocol();
    let sender = builder.add_sender(Void, None).unwrap();

    sender.send(()).unwrap();

    assert_eq!(&stream.take_written()[..], &[0x00]);
}

#[test]
fn test_struct_sender_writes_opcode_and_payload() {
    let (stream, mut builder) = u8_protocol();
    builder.add_sender(Void, None).unwrap();
    let sender = builder.add_sender(Struct((U8, U8)), None).unwrap();

    sender.send((0xFF, 45)).unwrap();
    sender.send((10, 0xFF)).unwrap();

    assert_eq!(&stream.take_written()[..], &[0x01, 0xFF, 45, 0x01, 10, 0xFF]);
}

#[test]
fn test_routes_by_opcode() {
    let (stream, mut builder) = u8_protocol();
    let (first, first_handler) = recorder::<u8>();
    let (second, second_handler) = recorder::<u16>();
    builder.add_receiver(U8, first_handler, None).unwrap();
    builder.add_receiver(U16, second_handler, None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x01, 0x34, 0x12, 0x00, 0x07]);

    protocol.poll().unwrap();
    assert!(first.lock().is_empty());
    assert_eq!(*second.lock(), vec![0x1234]);

    protocol.poll().unwrap();
    assert_eq!(*first.lock(), vec![7]);
    assert_eq!(protocol.stats().dispatched, 2);
}

#[test]
fn test_one_message_per_poll_and_exact_consumption() {
    let (stream, mut builder) = u8_protocol();
    let (seen, handler) = recorder::<u32>();
    builder.add_receiver(U32, handler, None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x00, 1, 0, 0, 0, 0x00, 2, 0, 0, 0]);

    protocol.poll().unwrap();
    assert_eq!(*seen.lock(), vec![1]);
    assert_eq!(stream.remaining(), 5);

    protocol.poll().unwrap();
    assert_eq!(*seen.lock(), vec![1, 2]);
    assert_eq!(stream.remaining(), 0);
}

// =============================================================================
// Drop Behavior Tests
// =============================================================================

#[test]
fn test_empty_stream_is_idle() {
    let (_stream, mut builder) = u8_protocol();
    builder.add_receiver(U8, |_| panic!("no message expected"), None).unwrap();
    let mut protocol = builder.build();

    assert_eq!(protocol.poll().unwrap(), PollOutcome::Idle);
    assert_eq!(protocol.stats().short_reads, 0);
}

#[test]
fn test_partial_opcode_is_discarded() {
    let stream = MemoryStream::new();
    let mut builder = Protocol::builder(stream.clone(), shared_output(stream.clone()), U16, U16);
    builder.add_receiver(U8, |_| panic!("no message expected"), None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x00]);

    assert_eq!(protocol.poll().unwrap(), PollOutcome::ShortRead { discarded: 1 });
    assert_eq!(stream.remaining(), 0);
    assert_eq!(protocol.stats().short_reads, 1);
}

#[test]
fn test_unknown_opcode_dropped_payload_left() {
    let (stream, mut builder) = u8_protocol();
    builder.add_receiver(U8, |_| panic!("no message expected"), None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x05, 0xAA]);

    assert_eq!(
        protocol.poll().unwrap(),
        PollOutcome::UnknownOpcode { code: Bytes::from_static(&[0x05]) }
    );
    assert_eq!(stream.remaining(), 1);
    assert_eq!(protocol.stats().unknown_opcodes, 1);
}

#[test]
fn test_decode_fault_propagates() {
    let (stream, mut builder) = u8_protocol();
    builder.add_receiver(U32, |_| panic!("no message expected"), None).unwrap();
    let mut protocol = builder.build();

    stream.feed(&[0x00, 0x01, 0x02]);

    let err = protocol.poll().unwrap_err();
    assert!(err.is_decode());
    assert_eq!(protocol.stats().decode_faults, 1);
}

#[test]
fn test_closed_stream_is_transport_fault() {
    use bytelang::stream::Transport;

    let (stream, mut builder) = u8_protocol();
    builder.add_receiver(U8, |_| {}, None).unwrap();
    let mut protocol = builder.build();

    stream.close();
    assert!(protocol.poll().unwrap_err().is_transport());
}

// =============================================================================
// Loopback Tests
// =============================================================================

#[test]
fn test_two_endpoints_over_loopback() {
    let (host_stream, board_stream) = MemoryStream::pair();

    let mut host = Protocol::builder(host_stream.clone(), shared_output(host_stream), U8, U8);
    let set_pair = host.add_sender(Struct((U8, U8)), Some("set_pair")).unwrap();
    let (host_seen, host_handler) = recorder::<u32>();
    host.add_receiver(U32, host_handler, Some("reply")).unwrap();
    let mut host = host.build();

    let mut board = Protocol::builder(board_stream.clone(), shared_output(board_stream), U8, U8);
    let reply = board.add_sender(U32, Some("reply")).unwrap();
    let (board_seen, board_handler) = recorder::<(u8, u8)>();
    board.add_receiver(Struct((U8, U8)), board_handler, Some("set_pair")).unwrap();
    let mut board = board.build();

    set_pair.send((3, 4)).unwrap();
    board.poll().unwrap();
    assert_eq!(*board_seen.lock(), vec![(3, 4)]);

    reply.send(1000).unwrap();
    host.poll().unwrap();
    assert_eq!(*host_seen.lock(), vec![1000]);
}

#[test]
fn test_senders_from_many_threads_do_not_interleave() {
    let (stream, mut builder) = u8_protocol();
    let sender = builder.add_sender(U32, None).unwrap();

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let sender = sender.clone();
            thread::spawn(move || {
                for i in 0..100u32 {
                    sender.send(t * 1000 + i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let written = stream.take_written();
    assert_eq!(written.len(), 4 * 100 * 5);
    for frame in written.chunks(5) {
        assert_eq!(frame[0], 0x00);
        let value = u32::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]);
        assert!(value % 1000 < 100);
    }
}
