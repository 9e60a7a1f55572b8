use byteorder::{
	LE,
	WriteBytesExt
};

use std::io::{
	self,
	Write
};

use thiserror::Error;

use rgk_core::io_ext::WriteBinExt;

use crate::{
	maxfile::{
		SizeConvention,
		HEADER_SIZE,
		MAGIC,
		PHY
	},
	phy::{
		PhyMesh,
		MAX_TEXTURE_NAME
	}
};

#[derive(Error, Debug)]
pub enum C3ExportError {
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Mesh {name:?}: {what} does not fit its u32 field")]
	Count {
		name: String,
		what: &'static str,
	},
	#[error("Mesh {name:?}: vertex {vertex} has {found} bone influences, blend count is {blend}")]
	Blend {
		name: String,
		vertex: usize,
		found: usize,
		blend: u32,
	},
	#[error("Mesh {name:?}: {declared} declared, {found} present")]
	CountMismatch {
		name: String,
		declared: u64,
		found: usize,
	},
	#[error("Mesh {name:?}: texture name {texture:?} cannot be stored")]
	Texture {
		name: String,
		texture: String,
	},
	#[error("Chunk of {0} bytes is too large for the size field")]
	ChunkSize(usize),
}

impl PhyMesh {
	/// Writes the PHY payload layout: everything after the chunk tag and size
	pub fn write<W>(&self, out: &mut W) -> Result<(), C3ExportError>
	where
		W: Write,
	{
		self.validate()?;

		let name_len = u32::try_from(self.name.len()).map_err(|_| self.count_error("name length"))?;
		out.write_u32::<LE>(name_len)?;
		out.write_all(self.name.as_bytes())?;
		out.write_u32::<LE>(self.blend_count)?;
		out.write_u32::<LE>(self.normal_vertex_count)?;
		out.write_u32::<LE>(self.alpha_vertex_count)?;

		for v in self.vertices.iter() {
			out.write_vec3_le(v.position)?;
			out.write_vec3_le(v.normal)?;
			out.write_vec2_le(v.uv)?;
			out.write_all(&v.bone_indices)?;
			for w in v.bone_weights.iter() {
				out.write_f32::<LE>(*w)?;
			}
		}

		out.write_vec3_le(self.bounds.min)?;
		out.write_vec3_le(self.bounds.max)?;
		out.write_mat4_rows_le(&self.bind_pose)?;

		out.write_u32::<LE>(self.normal_triangle_count)?;
		out.write_u32::<LE>(self.alpha_triangle_count)?;
		for t in self.triangles.iter() {
			for i in t.iter() {
				out.write_u16::<LE>(*i)?;
			}
		}

		if let Some(texture) = &self.texture {
			out.write_lstr_le(texture)?;
		}

		Ok(())
	}

	fn validate(&self) -> Result<(), C3ExportError> {
		if self.total_vertices() != self.vertices.len() as u64 {
			return Err(C3ExportError::CountMismatch {
				name: self.name.clone(),
				declared: self.total_vertices(),
				found: self.vertices.len(),
			});
		}
		if self.total_triangles() != self.triangles.len() as u64 {
			return Err(C3ExportError::CountMismatch {
				name: self.name.clone(),
				declared: self.total_triangles(),
				found: self.triangles.len(),
			});
		}

		let blend = self.blend_count as usize;
		for (i, v) in self.vertices.iter().enumerate() {
			let found = if v.bone_indices.len() != blend { v.bone_indices.len() } else { v.bone_weights.len() };
			if found != blend {
				return Err(C3ExportError::Blend {
					name: self.name.clone(),
					vertex: i,
					found: found,
					blend: self.blend_count,
				});
			}
		}

		// Only names the decoder would pick back up from the trailing bytes
		if let Some(texture) = &self.texture {
			if texture.is_empty() || texture.len() > MAX_TEXTURE_NAME || !texture.bytes().all(|b| (0x20..0x7f).contains(&b)) {
				return Err(C3ExportError::Texture {
					name: self.name.clone(),
					texture: texture.clone(),
				});
			}
		}

		Ok(())
	}

	fn count_error(&self, what: &'static str) -> C3ExportError {
		C3ExportError::Count {
			name: self.name.clone(),
			what: what,
		}
	}
}

/// Encodes a mesh as a PHY chunk payload
pub fn phy_payload(mesh: &PhyMesh) -> Result<Vec<u8>, C3ExportError> {
	let mut out = vec![];
	mesh.write(&mut out)?;

	Ok(out)
}

/// Builds a MAXFILE container in memory, one chunk at a time
pub struct MaxfileWriter {
	convention: SizeConvention,
	buf: Vec<u8>,
}

impl MaxfileWriter {
	pub fn new(convention: SizeConvention) -> MaxfileWriter {
		let mut buf = Vec::with_capacity(HEADER_SIZE);
		buf.extend_from_slice(MAGIC);
		buf.extend_from_slice(b" 00001");

		MaxfileWriter {
			convention: convention,
			buf: buf,
		}
	}

	/// Appends a raw chunk, sizing it under the writer's convention
	pub fn chunk(&mut self, tag: u32, payload: &[u8]) -> Result<&mut Self, C3ExportError> {
		let size = self.convention.declared_size(payload.len())
			.ok_or(C3ExportError::ChunkSize(payload.len()))?;

		self.buf.write_u32::<LE>(tag)?;
		self.buf.write_u32::<LE>(size)?;
		self.buf.extend_from_slice(payload);

		Ok(self)
	}

	pub fn phy(&mut self, mesh: &PhyMesh) -> Result<&mut Self, C3ExportError> {
		let payload = phy_payload(mesh)?;
		self.chunk(PHY, &payload)
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
