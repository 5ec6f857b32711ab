//! Payload codec: a self-describing, length-prefixed, typed parameter list.
//!
//! A [`Payload`] is `{ op_code: u16, parameters: bytes }`, where `parameters`
//! is a concatenation of parameter records:
//!
//! ```text
//! u32  length          // byte length of `value`, big-endian (framing)
//! byte value[length]
//! ```
//!
//! There is no type tag on the wire: the call site's type choice (the `T`
//! in `add_param::<T>` / `read_param::<T>`) carries the interpretation, and
//! `length` alone distinguishes integer/float widths. See [`PayloadBuilder`]
//! to build one and [`PayloadReader`] to read one back.

use crate::error::ProtoError;

/// `{ op_code, parameters }`: an application-defined opcode plus its typed
/// parameter list, opaque until read with a [`PayloadReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub op_code: u16,
    pub parameters: Vec<u8>,
}

impl Payload {
    /// `u16 op_code (big-endian) || parameters`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.parameters.len());
        out.extend_from_slice(&self.op_code.to_be_bytes());
        out.extend_from_slice(&self.parameters);
        out
    }

    /// Inverse of [`Payload::serialize`]. `bytes` must be exactly the
    /// serialized payload; the caller's enclosing frame determines the
    /// total length.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() < 2 {
            return Err(ProtoError::MalformedMessage("truncated payload header".into()));
        }
        let op_code = u16::from_be_bytes([bytes[0], bytes[1]]);
        Ok(Payload {
            op_code,
            parameters: bytes[2..].to_vec(),
        })
    }

    /// Start reading this payload's parameters in order.
    pub fn reader(&self) -> PayloadReader<'_> {
        PayloadReader::new(&self.parameters)
    }
}

/// A value that can be encoded into one parameter record.
///
/// The wire format carries no type tag, only a byte length: `encode_param`
/// just has to produce the bytes for the chosen encoding.
pub trait ParamValue {
    fn encode_param(&self) -> Vec<u8>;
}

impl ParamValue for bool {
    fn encode_param(&self) -> Vec<u8> {
        vec![if *self { 0x01 } else { 0x00 }]
    }
}

macro_rules! impl_param_value_int {
    ($($t:ty),+) => {
        $(impl ParamValue for $t {
            fn encode_param(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }
        })+
    };
}
impl_param_value_int!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl ParamValue for &str {
    fn encode_param(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl ParamValue for String {
    fn encode_param(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl ParamValue for &[u8] {
    fn encode_param(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl ParamValue for Vec<u8> {
    fn encode_param(&self) -> Vec<u8> {
        self.clone()
    }
}

/// Builds a [`Payload`] imperatively, one parameter record at a time.
///
/// Single-use by construction: [`PayloadBuilder::build`] takes `self` by
/// value, so a consumed builder cannot be appended to again.
pub struct PayloadBuilder {
    op_code: u16,
    parameters: Vec<u8>,
}

impl PayloadBuilder {
    pub fn new(op_code: u16) -> Self {
        Self {
            op_code,
            parameters: Vec::new(),
        }
    }

    /// Append one parameter record, encoding `value` per its `ParamValue`
    /// impl and prefixing with its big-endian `u32` length.
    pub fn add_param<T: ParamValue>(&mut self, value: T) -> &mut Self {
        let encoded = value.encode_param();
        self.parameters
            .extend_from_slice(&(encoded.len() as u32).to_be_bytes());
        self.parameters.extend_from_slice(&encoded);
        self
    }

    pub fn build(self) -> Payload {
        Payload {
            op_code: self.op_code,
            parameters: self.parameters,
        }
    }
}

/// Decodes a parameter record into `Self`, given the record's raw value
/// bytes (length already known from the wire record).
pub trait ParamDecode: Sized {
    fn decode_param(bytes: &[u8]) -> Result<Self, ProtoError>;
}

impl ParamDecode for bool {
    fn decode_param(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() != 1 {
            return Err(ProtoError::WidthMismatch);
        }
        match bytes[0] {
            0x00 => Ok(false),
            0x01 => Ok(true),
            _ => Err(ProtoError::InvalidBool),
        }
    }
}

macro_rules! impl_param_decode_int {
    ($t:ty, $width:expr) => {
        impl ParamDecode for $t {
            fn decode_param(bytes: &[u8]) -> Result<Self, ProtoError> {
                if bytes.len() != $width {
                    return Err(ProtoError::WidthMismatch);
                }
                let mut buf = [0u8; $width];
                buf.copy_from_slice(bytes);
                Ok(<$t>::from_le_bytes(buf))
            }
        }
    };
}
impl_param_decode_int!(i8, 1);
impl_param_decode_int!(u8, 1);
impl_param_decode_int!(i16, 2);
impl_param_decode_int!(u16, 2);
impl_param_decode_int!(i32, 4);
impl_param_decode_int!(u32, 4);
impl_param_decode_int!(i64, 8);
impl_param_decode_int!(u64, 8);
impl_param_decode_int!(f32, 4);
impl_param_decode_int!(f64, 8);

impl ParamDecode for String {
    fn decode_param(bytes: &[u8]) -> Result<Self, ProtoError> {
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtoError::InvalidUtf8)
    }
}

impl ParamDecode for Vec<u8> {
    fn decode_param(bytes: &[u8]) -> Result<Self, ProtoError> {
        Ok(bytes.to_vec())
    }
}

/// A cursor over a [`Payload`]'s `parameters` tail, reading records in order.
pub struct PayloadReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.data.len()
    }

    /// The `length` field of the next record, without advancing the cursor.
    pub fn peek_next_param_size(&self) -> Result<u32, ProtoError> {
        if self.data.len() - self.cursor < 4 {
            return Err(ProtoError::Truncated);
        }
        let len_bytes = &self.data[self.cursor..self.cursor + 4];
        Ok(u32::from_be_bytes([
            len_bytes[0],
            len_bytes[1],
            len_bytes[2],
            len_bytes[3],
        ]))
    }

    /// Read the next record's raw value bytes and advance the cursor.
    fn read_record(&mut self) -> Result<&'a [u8], ProtoError> {
        let len = self.peek_next_param_size()? as usize;
        let value_start = self.cursor + 4;
        let value_end = value_start
            .checked_add(len)
            .ok_or(ProtoError::Truncated)?;
        if value_end > self.data.len() {
            return Err(ProtoError::Truncated);
        }
        let value = &self.data[value_start..value_end];
        self.cursor = value_end;
        Ok(value)
    }

    /// Read one record and decode it strictly as `T`; fails with
    /// `WidthMismatch` if the record's length disagrees with `T`'s width.
    pub fn read_param<T: ParamDecode>(&mut self) -> Result<T, ProtoError> {
        let bytes = self.read_record()?;
        T::decode_param(bytes)
    }

    /// Width-dispatching signed integer read: `{1,2,4,8}`-byte records only.
    pub fn read_int(&mut self) -> Result<i64, ProtoError> {
        let bytes = self.read_record()?;
        match bytes.len() {
            1 => Ok(bytes[0] as i8 as i64),
            2 => Ok(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
            4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(i32::from_le_bytes(buf) as i64)
            }
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(i64::from_le_bytes(buf))
            }
            _ => Err(ProtoError::WidthMismatch),
        }
    }

    /// Width-dispatching unsigned integer read: `{1,2,4,8}`-byte records
    /// only. Narrower widths come back zero-extended into a `u64`.
    pub fn read_uint(&mut self) -> Result<u64, ProtoError> {
        let bytes = self.read_record()?;
        match bytes.len() {
            1 => Ok(bytes[0] as u64),
            2 => Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as u64),
            4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(u32::from_le_bytes(buf) as u64)
            }
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(u64::from_le_bytes(buf))
            }
            _ => Err(ProtoError::WidthMismatch),
        }
    }

    /// Width-dispatching float read: `{4,8}`-byte records only.
    pub fn read_float(&mut self) -> Result<f64, ProtoError> {
        let bytes = self.read_record()?;
        match bytes.len() {
            4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(f32::from_le_bytes(buf) as f64)
            }
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(f64::from_le_bytes(buf))
            }
            _ => Err(ProtoError::WidthMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serialize_roundtrip() {
        let mut builder = PayloadBuilder::new(0x0042);
        builder
            .add_param(true)
            .add_param(-7i32)
            .add_param("hi".to_string())
            .add_param(vec![0xDEu8, 0xAD])
            .add_param(3.5f64);
        let payload = builder.build();

        let wire = payload.serialize();
        let decoded = Payload::deserialize(&wire).unwrap();
        assert_eq!(decoded.op_code, 0x0042);

        let mut reader = decoded.reader();
        assert!(reader.read_param::<bool>().unwrap());
        assert_eq!(reader.read_int().unwrap(), -7);
        assert_eq!(reader.read_param::<String>().unwrap(), "hi");
        assert_eq!(reader.read_param::<Vec<u8>>().unwrap(), vec![0xDE, 0xAD]);
        assert_eq!(reader.read_float().unwrap(), 3.5);
        assert!(!reader.has_more());
    }

    #[test]
    fn read_param_width_mismatch() {
        let mut builder = PayloadBuilder::new(1);
        builder.add_param(7u16); // 2-byte record
        let payload = builder.build();
        let mut reader = payload.reader();
        assert!(matches!(reader.read_param::<u32>(), Err(ProtoError::WidthMismatch)));
    }

    #[test]
    fn read_uint_widens_from_narrow_record() {
        let mut builder = PayloadBuilder::new(1);
        builder.add_param(7u16);
        let payload = builder.build();
        let mut reader = payload.reader();
        assert_eq!(reader.read_uint().unwrap(), 7u64);
    }

    #[test]
    fn read_param_truncated() {
        let payload = Payload {
            op_code: 1,
            parameters: vec![0x00, 0x00, 0x00, 0x05, 0x01, 0x02], // claims 5 bytes, has 2
        };
        let mut reader = payload.reader();
        assert!(matches!(reader.read_param::<Vec<u8>>(), Err(ProtoError::Truncated)));
    }

    #[test]
    fn read_param_invalid_bool() {
        let mut builder = PayloadBuilder::new(1);
        builder.add_param(5u8); // 1 byte, but not 0 or 1
        let payload = builder.build();
        let mut reader = payload.reader();
        assert!(matches!(reader.read_param::<bool>(), Err(ProtoError::InvalidBool)));
    }

    #[test]
    fn read_param_invalid_utf8() {
        let payload = Payload {
            op_code: 1,
            parameters: vec![0x00, 0x00, 0x00, 0x01, 0xFF],
        };
        let mut reader = payload.reader();
        assert!(matches!(reader.read_param::<String>(), Err(ProtoError::InvalidUtf8)));
    }

    proptest::proptest! {
        #[test]
        fn payload_roundtrip_arbitrary_ints(op in 0u16..=u16::MAX, v in proptest::num::i32::ANY) {
            let mut builder = PayloadBuilder::new(op);
            builder.add_param(v);
            let payload = builder.build();
            let wire = payload.serialize();
            let decoded = Payload::deserialize(&wire).unwrap();
            let mut reader = decoded.reader();
            proptest::prop_assert_eq!(decoded.op_code, op);
            proptest::prop_assert_eq!(reader.read_param::<i32>().unwrap(), v);
        }

        #[test]
        fn payload_roundtrip_arbitrary_bytes(bytes in proptest::collection::vec(proptest::num::u8::ANY, 0..200)) {
            let mut builder = PayloadBuilder::new(0);
            builder.add_param(bytes.clone());
            let payload = builder.build();
            let wire = payload.serialize();
            let decoded = Payload::deserialize(&wire).unwrap();
            let mut reader = decoded.reader();
            proptest::prop_assert_eq!(reader.read_param::<Vec<u8>>().unwrap(), bytes);
        }
    }
}
