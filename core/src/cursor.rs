use byteorder::{
	ByteOrder,
	LE
};

use thiserror::Error;

use ultraviolet::{
	mat::Mat4,
	vec::{
		Vec2,
		Vec3,
		Vec4
	}
};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Truncated read at offset {offset}: {requested} bytes requested, {remaining} remaining")]
pub struct ReadError {
	pub offset: usize,
	pub requested: usize,
	pub remaining: usize,
}

/// Bounds-checked little endian reader over a borrowed byte window.
///
/// Every read either consumes exactly the requested number of bytes or fails
/// with a [`ReadError`] and leaves the position where it was.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	pub fn new(buf: &'a [u8]) -> ByteCursor<'a> {
		ByteCursor {
			buf: buf,
			pos: 0,
		}
	}

	/// Current offset from the start of the window
	#[inline]
	pub fn position(&self) -> usize {
		self.pos
	}

	/// Total length of the window
	#[inline]
	pub fn len(&self) -> usize {
		self.buf.len()
	}

	#[inline]
	pub fn remaining(&self) -> usize {
		self.buf.len() - self.pos
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.remaining() == 0
	}

	/// Returns the requested bytes without advancing
	pub fn peek_bytes(&self, n: usize) -> Result<&'a [u8], ReadError> {
		self.check(n)?;
		Ok(&self.buf[self.pos..self.pos + n])
	}

	pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
		let bytes = self.peek_bytes(n)?;
		self.pos += n;

		Ok(bytes)
	}

	pub fn skip(&mut self, n: usize) -> Result<(), ReadError> {
		self.read_bytes(n).map(|_| ())
	}

	#[inline]
	pub fn read_u8(&mut self) -> Result<u8, ReadError> {
		Ok(self.read_bytes(1)?[0])
	}

	#[inline]
	pub fn read_u16(&mut self) -> Result<u16, ReadError> {
		Ok(LE::read_u16(self.read_bytes(2)?))
	}

	#[inline]
	pub fn read_u32(&mut self) -> Result<u32, ReadError> {
		Ok(LE::read_u32(self.read_bytes(4)?))
	}

	#[inline]
	pub fn read_f32(&mut self) -> Result<f32, ReadError> {
		Ok(LE::read_f32(self.read_bytes(4)?))
	}

	/// Reads `n` bytes as ASCII. The text need not be null-terminated, and
	/// bytes outside the ASCII range are replaced with U+FFFD.
	pub fn read_fixed_string(&mut self, n: usize) -> Result<String, ReadError> {
		let raw = self.read_bytes(n)?;

		Ok(raw.iter()
			.map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
			.collect())
	}

	pub fn read_vec2(&mut self) -> Result<Vec2, ReadError> {
		self.check(8)?;
		Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
	}

	pub fn read_vec3(&mut self) -> Result<Vec3, ReadError> {
		self.check(12)?;
		Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
	}

	pub fn read_vec4(&mut self) -> Result<Vec4, ReadError> {
		self.check(16)?;
		Ok(Vec4::new(self.read_f32()?, self.read_f32()?, self.read_f32()?, self.read_f32()?))
	}

	/// Reads a 4x4 matrix stored as 16 floats in row-major order.
	/// The returned [`Mat4`] has the same rows, i.e. `m.cols[c][r]` is file row `r`, column `c`.
	pub fn read_mat4_rows(&mut self) -> Result<Mat4, ReadError> {
		self.check(64)?;

		let r = [self.read_vec4()?, self.read_vec4()?, self.read_vec4()?, self.read_vec4()?];

		Ok(Mat4::new(
			Vec4::new(r[0].x, r[1].x, r[2].x, r[3].x),
			Vec4::new(r[0].y, r[1].y, r[2].y, r[3].y),
			Vec4::new(r[0].z, r[1].z, r[2].z, r[3].z),
			Vec4::new(r[0].w, r[1].w, r[2].w, r[3].w),
		))
	}

	// Composite reads pre-check their full size so a failure never leaves a partial advance
	#[inline]
	fn check(&self, n: usize) -> Result<(), ReadError> {
		let remaining = self.remaining();
		if n > remaining {
			return Err(ReadError {
				offset: self.pos,
				requested: n,
				remaining: remaining,
			});
		}

		Ok(())
	}
}
