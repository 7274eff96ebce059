use bytestream::{ByteReader, ByteWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    U8(u8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(u32),
    Str(String),
    Bytes(Vec<u8>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::U8),
        any::<u16>().prop_map(Op::U16),
        any::<i16>().prop_map(Op::I16),
        any::<u32>().prop_map(Op::U32),
        any::<i32>().prop_map(Op::I32),
        any::<u32>().prop_map(Op::F32),
        ".{0,24}".prop_map(Op::Str),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(Op::Bytes),
    ]
}

proptest! {
    #[test]
    fn mixed_ops_roundtrip(ops in proptest::collection::vec(op_strategy(), 0..64)) {
        let mut writer = ByteWriter::new();
        for op in &ops {
            match op {
                Op::U8(v) => writer.write_u8(*v),
                Op::U16(v) => writer.write_u16(*v),
                Op::I16(v) => writer.write_i16(*v),
                Op::U32(v) => writer.write_u32(*v),
                Op::I32(v) => writer.write_i32(*v),
                Op::F32(bits) => writer.write_f32(f32::from_bits(*bits)),
                Op::Str(s) => writer.write_str16(s).unwrap(),
                Op::Bytes(b) => writer.write_bytes16(b).unwrap(),
            }
        }
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes);
        for op in &ops {
            match op {
                Op::U8(v) => prop_assert_eq!(reader.read_u8().unwrap(), *v),
                Op::U16(v) => prop_assert_eq!(reader.read_u16().unwrap(), *v),
                Op::I16(v) => prop_assert_eq!(reader.read_i16().unwrap(), *v),
                Op::U32(v) => prop_assert_eq!(reader.read_u32().unwrap(), *v),
                Op::I32(v) => prop_assert_eq!(reader.read_i32().unwrap(), *v),
                Op::F32(bits) => prop_assert_eq!(reader.read_f32().unwrap().to_bits(), *bits),
                Op::Str(s) => prop_assert_eq!(reader.read_str16().unwrap(), s.as_str()),
                Op::Bytes(b) => prop_assert_eq!(reader.read_bytes16().unwrap(), b.as_slice()),
            }
        }
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn reader_never_panics_on_garbage(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut reader = ByteReader::new(&data);
        while !reader.is_empty() {
            if reader.read_str16().is_err() && reader.read_u8().is_err() {
                break;
            }
        }
    }
}
