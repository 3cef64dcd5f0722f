//! Binary buffer codec: the byte-level read/write primitives that every encoder and decoder
//! (the schema-driven [`Codec`](crate::codec::Codec) and generated code alike) calls into.
//!
//! ## Wire contract
//!
//! | Primitive | Framing |
//! |---|---|
//! | `byte`, `int8`, `bool` | 1 byte |
//! | `int16`, `uint16`, `int32`, `uint32`, `float32` | fixed-width little-endian |
//! | var uint | LEB128, 7 payload bits per byte, at most 5 bytes |
//! | var int | zig-zag, then var uint |
//! | var float | exponent rotated into the low byte; a zero low byte is sent as a single `0x00` |
//! | low precision float | `round(v * 1000)` as var int |
//! | string | var uint UTF-8 byte length, then the bytes (no terminator) |
//! | byte array | var uint byte length, then the bytes |
//! | typed numeric array | var uint *byte* length, then little-endian element bytes |
//!
//! A buffer is either written (starting empty) or read (built from a finished byte region).
//! Writes only append; reads only advance the cursor.

use byteorder::{ByteOrder, LittleEndian};
use std::string::FromUtf8Error;

/// Capacity of a buffer created with [`ByteBuffer::new`].
pub const DEFAULT_CAPACITY: usize = 256;

/// Scale applied by [`ByteBuffer::write_low_precision_float`] (three decimal places).
pub const LOW_PRECISION_SCALE: f64 = 1000.0;

/// Maximum number of 7-bit groups in a var uint (35 bits, truncated to 32).
pub const MAX_VAR_UINT_BYTES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("Out of bounds: need {needed} byte(s) at offset {offset}, buffer length is {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error("Typed array of {len} byte(s) is not a multiple of element size {element_size}")]
    ArrayLength { len: usize, element_size: usize },
}

/// Append-only / sequentially-read byte container.
///
/// `position() <= len() <= capacity()` always holds.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    index: usize,
    wiggle_room: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        ByteBuffer::new()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        ByteBuffer::from_vec(data)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        ByteBuffer::from_vec(data.to_vec())
    }
}

impl ByteBuffer {
    /// Empty buffer for encoding, with [`DEFAULT_CAPACITY`] bytes reserved.
    pub fn new() -> Self {
        ByteBuffer::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            data: Vec::with_capacity(capacity),
            index: 0,
            wiggle_room: 1,
        }
    }

    /// Sets the growth multiplier applied before doubling. Values below 1 are treated as 1.
    pub fn with_wiggle_room(mut self, wiggle_room: usize) -> Self {
        self.wiggle_room = wiggle_room.max(1);
        self
    }

    /// Buffer for decoding: length is the size of `data`, cursor at 0.
    pub fn from_vec(data: Vec<u8>) -> Self {
        ByteBuffer {
            data,
            index: 0,
            wiggle_room: 1,
        }
    }

    /// Number of committed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Bytes left between the cursor and the end of the committed region.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Committed bytes (never spare capacity).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Final written region, trimmed to `len()`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Drops all committed bytes and rewinds the cursor; capacity is kept for reuse.
    pub fn clear(&mut self) {
        self.data.clear();
        self.index = 0;
    }

    // ==================== Growth ====================

    /// Extends the committed length by `amount` zeroed bytes and returns the offset where they
    /// start. When capacity is short, reserves `2 * (len + amount) * wiggle_room` bytes.
    fn grow_by(&mut self, amount: usize) -> usize {
        let start = self.data.len();
        let required = start + amount;
        if required > self.data.capacity() {
            let target = required
                .saturating_mul(self.wiggle_room)
                .saturating_mul(2)
                .max(required);
            self.data.reserve_exact(target - start);
        }
        self.data.resize(required, 0);
        start
    }

    fn slot(&mut self, amount: usize) -> &mut [u8] {
        let start = self.grow_by(amount);
        &mut self.data[start..start + amount]
    }

    /// Writes a length prefix.
    ///
    /// # Panics
    ///
    /// Panics when `len` does not fit the 32-bit var uint prefix; such a region cannot be framed.
    fn write_length(&mut self, len: usize) {
        assert!(
            len <= u32::MAX as usize,
            "length {} exceeds the 32-bit wire prefix",
            len
        );
        self.write_var_uint(len as u32);
    }

    // ==================== Writers ====================

    pub fn write_byte(&mut self, value: u8) {
        let start = self.grow_by(1);
        self.data[start] = value;
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(value as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_byte(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_byte(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        LittleEndian::write_u16(self.slot(2), value);
    }

    pub fn write_i16(&mut self, value: i16) {
        LittleEndian::write_i16(self.slot(2), value);
    }

    pub fn write_u32(&mut self, value: u32) {
        LittleEndian::write_u32(self.slot(4), value);
    }

    pub fn write_i32(&mut self, value: i32) {
        LittleEndian::write_i32(self.slot(4), value);
    }

    /// Raw IEEE-754 bit pattern, little-endian.
    pub fn write_f32(&mut self, value: f32) {
        LittleEndian::write_f32(self.slot(4), value);
    }

    /// LEB128: low 7 bits per byte, `0x80` set on every byte but the last.
    pub fn write_var_uint(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.write_byte(byte);
                return;
            }
            self.write_byte(byte | 0x80);
        }
    }

    pub fn write_var_int(&mut self, value: i32) {
        self.write_var_uint(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Rotates the 8 exponent bits into the low byte. Zero and denormals (exponent 0) are sent as a
    /// single `0x00`; everything else as the 4 rotated bytes, little-endian.
    pub fn write_var_float(&mut self, value: f32) {
        let bits = value.to_bits().rotate_left(9);
        if bits & 0xff == 0 {
            self.write_byte(0);
            return;
        }
        LittleEndian::write_u32(self.slot(4), bits);
    }

    /// Lossy: keeps three decimal places. Rounds half up, saturating at the `i32` range.
    pub fn write_low_precision_float(&mut self, value: f64) {
        let scaled = (value * LOW_PRECISION_SCALE + 0.5).floor();
        self.write_var_int(scaled as i32);
    }

    /// Var uint UTF-8 byte length, then the bytes.
    pub fn write_string(&mut self, value: &str) {
        self.write_length(value.len());
        self.write_bytes(value.as_bytes());
    }

    /// Var uint byte length, then the bytes.
    pub fn write_byte_array(&mut self, value: &[u8]) {
        self.write_length(value.len());
        self.write_bytes(value);
    }

    /// Unframed append.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.slot(value.len()).copy_from_slice(value);
    }

    pub fn write_i8_array(&mut self, values: &[i8]) {
        self.write_length(values.len());
        for (dst, src) in self.slot(values.len()).iter_mut().zip(values) {
            *dst = *src as u8;
        }
    }

    pub fn write_u16_array(&mut self, values: &[u16]) {
        self.write_length(values.len() * 2);
        LittleEndian::write_u16_into(values, self.slot(values.len() * 2));
    }

    pub fn write_i16_array(&mut self, values: &[i16]) {
        self.write_length(values.len() * 2);
        LittleEndian::write_i16_into(values, self.slot(values.len() * 2));
    }

    pub fn write_u32_array(&mut self, values: &[u32]) {
        self.write_length(values.len() * 4);
        LittleEndian::write_u32_into(values, self.slot(values.len() * 4));
    }

    pub fn write_i32_array(&mut self, values: &[i32]) {
        self.write_length(values.len() * 4);
        LittleEndian::write_i32_into(values, self.slot(values.len() * 4));
    }

    pub fn write_f32_array(&mut self, values: &[f32]) {
        self.write_length(values.len() * 4);
        LittleEndian::write_f32_into(values, self.slot(values.len() * 4));
    }

    // ==================== Readers ====================

    fn out_of_bounds(&self, needed: usize) -> BufferError {
        BufferError::OutOfBounds {
            offset: self.index,
            needed,
            len: self.data.len(),
        }
    }

    /// Consumes exactly `n` bytes; the cursor does not move on failure.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], BufferError> {
        let start = self.index;
        let end = match start.checked_add(n) {
            Some(end) if end <= self.data.len() => end,
            _ => return Err(self.out_of_bounds(n)),
        };
        self.index = end;
        Ok(&self.data[start..end])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_byte(&mut self) -> Result<u8, BufferError> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Any nonzero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, BufferError> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, BufferError> {
        self.read_byte()
    }

    pub fn read_i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, BufferError> {
        Ok(LittleEndian::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, BufferError> {
        Ok(LittleEndian::read_i16(&self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, BufferError> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, BufferError> {
        Ok(LittleEndian::read_i32(&self.read_array::<4>()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, BufferError> {
        Ok(LittleEndian::read_f32(&self.read_array::<4>()?))
    }

    /// Inverse LEB128. Stops at a byte without the continuation bit or after
    /// [`MAX_VAR_UINT_BYTES`] groups, whichever comes first; bits above 32 are dropped.
    pub fn read_var_uint(&mut self) -> Result<u32, BufferError> {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            value |= ((byte & 0x7f) as u32) << shift;
            shift += 7;
            if byte & 0x80 == 0 || shift >= 7 * MAX_VAR_UINT_BYTES as u32 {
                return Ok(value);
            }
        }
    }

    pub fn read_var_int(&mut self) -> Result<i32, BufferError> {
        let value = self.read_var_uint()?;
        Ok(((value >> 1) as i32) ^ -((value & 1) as i32))
    }

    /// A leading `0x00` is the zero shorthand; otherwise 4 bytes with the exponent rotated back.
    pub fn read_var_float(&mut self) -> Result<f32, BufferError> {
        match self.data.get(self.index).copied() {
            None => Err(self.out_of_bounds(1)),
            Some(0) => {
                self.index += 1;
                Ok(0.0)
            }
            Some(_) => {
                let bits = LittleEndian::read_u32(&self.read_array::<4>()?);
                Ok(f32::from_bits(bits.rotate_right(9)))
            }
        }
    }

    pub fn read_low_precision_float(&mut self) -> Result<f64, BufferError> {
        Ok(self.read_var_int()? as f64 / LOW_PRECISION_SCALE)
    }

    /// Invalid UTF-8 is rejected, never replaced or truncated.
    pub fn read_string(&mut self) -> Result<String, BufferError> {
        let len = self.read_var_uint()? as usize;
        let bytes = self.read_bytes(len)?.to_vec();
        Ok(String::from_utf8(bytes)?)
    }

    pub fn read_byte_array(&mut self) -> Result<Vec<u8>, BufferError> {
        let len = self.read_var_uint()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Reads a byte-length-prefixed region holding whole elements of `element_size` bytes.
    fn read_packed(&mut self, element_size: usize) -> Result<&[u8], BufferError> {
        let start = self.index;
        let len = self.read_var_uint()? as usize;
        if len % element_size != 0 {
            self.index = start;
            return Err(BufferError::ArrayLength { len, element_size });
        }
        if self.remaining() < len {
            let err = self.out_of_bounds(len);
            self.index = start;
            return Err(err);
        }
        self.read_bytes(len)
    }

    pub fn read_i8_array(&mut self) -> Result<Vec<i8>, BufferError> {
        Ok(self.read_packed(1)?.iter().map(|&b| b as i8).collect())
    }

    pub fn read_u16_array(&mut self) -> Result<Vec<u16>, BufferError> {
        let bytes = self.read_packed(2)?;
        let mut out = vec![0u16; bytes.len() / 2];
        LittleEndian::read_u16_into(bytes, &mut out);
        Ok(out)
    }

    pub fn read_i16_array(&mut self) -> Result<Vec<i16>, BufferError> {
        let bytes = self.read_packed(2)?;
        let mut out = vec![0i16; bytes.len() / 2];
        LittleEndian::read_i16_into(bytes, &mut out);
        Ok(out)
    }

    pub fn read_u32_array(&mut self) -> Result<Vec<u32>, BufferError> {
        let bytes = self.read_packed(4)?;
        let mut out = vec![0u32; bytes.len() / 4];
        LittleEndian::read_u32_into(bytes, &mut out);
        Ok(out)
    }

    pub fn read_i32_array(&mut self) -> Result<Vec<i32>, BufferError> {
        let bytes = self.read_packed(4)?;
        let mut out = vec![0i32; bytes.len() / 4];
        LittleEndian::read_i32_into(bytes, &mut out);
        Ok(out)
    }

    pub fn read_f32_array(&mut self) -> Result<Vec<f32>, BufferError> {
        let bytes = self.read_packed(4)?;
        let mut out = vec![0f32; bytes.len() / 4];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_doubles_requirement() {
        let mut bb = ByteBuffer::with_capacity(0);
        bb.write_byte(1);
        assert!(bb.capacity() >= 2);
        bb.write_u32(7);
        assert_eq!(bb.len(), 5);
        assert!(bb.capacity() >= 10);
    }

    #[test]
    fn growth_applies_wiggle_room() {
        let mut bb = ByteBuffer::with_capacity(0).with_wiggle_room(3);
        bb.write_bytes(&[1, 2]);
        assert!(bb.capacity() >= 12, "capacity {}", bb.capacity());
        assert_eq!(bb.as_bytes(), &[1, 2]);
    }

    #[test]
    fn wiggle_room_zero_is_clamped() {
        let mut bb = ByteBuffer::with_capacity(0).with_wiggle_room(0);
        bb.write_bytes(&[9; 3]);
        assert!(bb.capacity() >= 6);
    }

    #[test]
    fn writes_do_not_move_cursor() {
        let mut bb = ByteBuffer::from_vec(vec![5]);
        assert_eq!(bb.read_byte(), Ok(5));
        bb.write_u16(0xbeef);
        assert_eq!(bb.position(), 1);
        assert_eq!(bb.read_u16(), Ok(0xbeef));
        assert_eq!(bb.remaining(), 0);
    }

    #[test]
    fn failed_fixed_read_keeps_cursor() {
        let mut bb = ByteBuffer::from_vec(vec![1, 2, 3]);
        assert!(bb.read_u32().is_err());
        assert_eq!(bb.position(), 0);
        assert_eq!(bb.read_u16(), Ok(0x0201));
    }

    #[test]
    fn misaligned_typed_array_is_rejected() {
        let mut bb = ByteBuffer::from_vec(vec![3, 1, 2, 3]);
        assert_eq!(
            bb.read_u16_array(),
            Err(BufferError::ArrayLength { len: 3, element_size: 2 })
        );
        assert_eq!(bb.position(), 0);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut bb = ByteBuffer::new();
        bb.write_string("hello");
        let cap = bb.capacity();
        bb.clear();
        assert!(bb.is_empty());
        assert_eq!(bb.capacity(), cap);
    }
}
