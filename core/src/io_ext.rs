use byteorder::{
	LE,
	WriteBytesExt
};

use std::io::Result;

use ultraviolet::{
	mat::Mat4,
	vec::{
		Vec2,
		Vec3,
		Vec4
	}
};

pub trait WriteBinExt: WriteBytesExt {
	/// Writes a u32 length prefix followed by the raw bytes of `s`
	#[inline]
	fn write_lstr_le(&mut self, s: &str) -> Result<()> {
		self.write_u32::<LE>(s.len() as u32)?;
		self.write_all(s.as_bytes())
	}

	/// Writes a little endian 2D vector
	#[inline]
	fn write_vec2_le(&mut self, v: Vec2) -> Result<()> {
		self.write_f32::<LE>(v.x)?;
		self.write_f32::<LE>(v.y)
	}

	/// Writes a little endian 3D vector
	#[inline]
	fn write_vec3_le(&mut self, v: Vec3) -> Result<()> {
		self.write_f32::<LE>(v.x)?;
		self.write_f32::<LE>(v.y)?;
		self.write_f32::<LE>(v.z)
	}

	/// Writes a little endian 4D vector
	#[inline]
	fn write_vec4_le(&mut self, v: Vec4) -> Result<()> {
		self.write_f32::<LE>(v.x)?;
		self.write_f32::<LE>(v.y)?;
		self.write_f32::<LE>(v.z)?;
		self.write_f32::<LE>(v.w)
	}

	/// Writes a 4x4 matrix as 16 little endian floats, row by row
	fn write_mat4_rows_le(&mut self, m: &Mat4) -> Result<()> {
		for r in 0..4 {
			for c in 0..4 {
				let col = m.cols[c];
				self.write_f32::<LE>([col.x, col.y, col.z, col.w][r])?;
			}
		}

		Ok(())
	}
}

impl<W> WriteBinExt for W
where
	W: WriteBytesExt + ?Sized,
{
}
