//! Tests for instructions
//!
//! These tests verify:
//! - `send` writes opcode and payload in one write
//! - `receive` decodes the payload only
//! - Display and size of the type-erased info

use bytes::Bytes;

use bytelang::serializer::{ByteVector, Struct, Void, U16, U8};
use bytelang::stream::OutputStream;
use bytelang::{Instruction, Result};

/// Records each write separately
#[derive(Default)]
struct Writes(Vec<Vec<u8>>);

impl OutputStream for Writes {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.0.push(data.to_vec());
        Ok(())
    }
}

#[test]
fn test_send_writes_code_then_payload_once() {
    let instruction = Instruction::new(
        Bytes::from_static(&[0x01]),
        Struct((U8, U8)),
        Some("set_manipulator".to_string()),
    );

    let mut output = Writes::default();
    instruction.send(&mut output, &(0xFF, 90)).unwrap();

    assert_eq!(output.0, vec![vec![0x01, 0xFF, 90]]);
    assert_eq!(instruction.to_string(), "0x01 set_manipulator: (u8, u8)");
    assert_eq!(instruction.name(), Some("set_manipulator"));
}

#[test]
fn test_receive_decodes_payload_only() {
    let instruction = Instruction::new(Bytes::from_static(&[0x00]), U8, None);
    let mut input: &[u8] = &[0x2A, 0x07];

    assert_eq!(instruction.receive(&mut input).unwrap(), 0x2A);
    assert_eq!(input, &[0x07]);
    assert_eq!(instruction.info().to_string(), "0x00 <anonymous>: u8");
}

#[test]
fn test_info_describes_payload() {
    let void = Instruction::new(Bytes::from_static(&[0x00, 0x02]), Void, None);
    assert_eq!(void.info().payload_size(), Some(0));
    assert_eq!(void.info().to_string(), "0x0002 <anonymous>: void");

    let log = Instruction::new(
        Bytes::from_static(&[0x01]),
        ByteVector::new(U16),
        Some("log".to_string()),
    );
    assert_eq!(log.info().payload_size(), None);
    assert_eq!(log.info().signature(), "u8[u16]");
    assert_eq!(&log.code()[..], &[0x01]);
}
