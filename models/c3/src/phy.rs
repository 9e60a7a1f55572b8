use std::ops::Range;

use ultraviolet::{
	mat::Mat4,
	vec::{
		Vec2,
		Vec3
	}
};

use rgk_core::scene::{
	BoneWeight,
	Bounds,
	Face,
	Mesh,
	Vertex as SceneVertex
};

/// Fixed part of a vertex: position, normal and texture coordinate
pub const VERTEX_BASE_SIZE: u64 = 32;
/// Longest texture name accepted from the bytes after the triangle list
pub const MAX_TEXTURE_NAME: usize = 1024;

/// Size in bytes of one vertex with `blend` bone influences
#[inline]
pub fn vertex_stride(blend: u32) -> u64 {
	VERTEX_BASE_SIZE + 5 * blend as u64
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
	pub position: Vec3,
	pub normal: Vec3,
	pub uv: Vec2,
	pub bone_indices: Vec<u8>,
	pub bone_weights: Vec<f32>,
}

/// A skinned mesh part decoded from a PHY chunk
#[derive(Clone, Debug, PartialEq)]
pub struct PhyMesh {
	pub name: String,
	pub blend_count: u32,
	pub normal_vertex_count: u32,
	pub alpha_vertex_count: u32,
	/// Opaque vertices first, then alpha-blended ones
	pub vertices: Vec<Vertex>,
	pub bounds: Bounds,
	/// Rest placement, same rows as stored in the file
	pub bind_pose: Mat4,
	pub normal_triangle_count: u32,
	pub alpha_triangle_count: u32,
	pub triangles: Vec<[u16; 3]>,
	/// Texture name found after the triangle list, if any
	pub texture: Option<String>,
}

impl PhyMesh {
	pub fn stride(&self) -> u64 {
		vertex_stride(self.blend_count)
	}

	pub fn total_vertices(&self) -> u64 {
		self.normal_vertex_count as u64 + self.alpha_vertex_count as u64
	}

	pub fn total_triangles(&self) -> u64 {
		self.normal_triangle_count as u64 + self.alpha_triangle_count as u64
	}

	pub fn normal_vertices(&self) -> &[Vertex] {
		&self.vertices[clamp(0..self.normal_vertex_count as usize, self.vertices.len())]
	}

	pub fn alpha_vertices(&self) -> &[Vertex] {
		&self.vertices[clamp(self.normal_vertex_count as usize..usize::MAX, self.vertices.len())]
	}

	pub fn normal_triangles(&self) -> &[[u16; 3]] {
		&self.triangles[clamp(0..self.normal_triangle_count as usize, self.triangles.len())]
	}

	pub fn alpha_triangles(&self) -> &[[u16; 3]] {
		&self.triangles[clamp(self.normal_triangle_count as usize..usize::MAX, self.triangles.len())]
	}

	/// Converts to the shared scene mesh. Bone indices become skin weights as is;
	/// both triangle ranges become faces in file order.
	pub fn to_mesh(&self) -> Mesh {
		let vertices = self.vertices.iter().map(|v| {
			let mut vert = SceneVertex::new(v.position);
			vert.normal = Some(v.normal);
			vert.uv.push(v.uv);
			vert.weights = v.bone_indices.iter()
				.zip(v.bone_weights.iter())
				.map(|(&bone, &weight)| BoneWeight {
					bone: bone as usize,
					weight: weight,
				})
				.collect();

			vert
		}).collect();

		Mesh {
			vertices: vertices,
			faces: self.triangles.iter()
				.map(|t| Face::Triangle([t[0] as usize, t[1] as usize, t[2] as usize]))
				.collect(),
			bounds: Some(self.bounds),
		}
	}

	/// Scene mesh with the bind pose applied, for joining several parts into one geometry
	pub fn to_posed_mesh(&self) -> Mesh {
		let pose = &self.bind_pose;
		let mut mesh = self.to_mesh();

		for v in mesh.vertices.iter_mut() {
			v.position = pose.transform_point3(v.position);
			v.normal = v.normal.map(|n| {
				let n = pose.transform_vec3(n);
				if n.mag_sq() > 0.0 { n.normalized() } else { n }
			});
		}

		let (lo, hi) = (self.bounds.min, self.bounds.max);
		mesh.bounds = (0..8)
			.map(|i| pose.transform_point3(Vec3::new(
				if i & 1 == 0 { lo.x } else { hi.x },
				if i & 2 == 0 { lo.y } else { hi.y },
				if i & 4 == 0 { lo.z } else { hi.z },
			)))
			.map(|p| Bounds { min: p, max: p })
			.reduce(|a, b| a.union(&b));

		mesh
	}
}

fn clamp(r: Range<usize>, len: usize) -> Range<usize> {
	r.start.min(len)..r.end.min(len)
}

#[cfg(feature = "import")]
pub mod import {
	use rgk_core::cursor::{
		ByteCursor,
		ReadError
	};

	use crate::{
		import::{
			C3ImportError,
			Diagnostic
		},
		maxfile::Chunk,
		ImportCfg,
		ImportFlag
	};
	use super::*;

	impl Vertex {
		fn read(cur: &mut ByteCursor, blend: u32) -> Result<Vertex, ReadError> {
			let position = cur.read_vec3()?;
			let normal = cur.read_vec3()?;
			let uv = cur.read_vec2()?;
			let bone_indices = cur.read_bytes(blend as usize)?.to_vec();
			let bone_weights = (0..blend)
				.map(|_| cur.read_f32())
				.collect::<Result<Vec<f32>, ReadError>>()?;

			Ok(Vertex {
				position: position,
				normal: normal,
				uv: uv,
				bone_indices: bone_indices,
				bone_weights: bone_weights,
			})
		}
	}

	impl PhyMesh {
		/// Decodes a PHY chunk payload.
		///
		/// Reads never leave the chunk's declared payload; needing more bytes than it
		/// holds fails with [`C3ImportError::ChunkOverrun`]. Stopping short of the end
		/// is reported as [`Diagnostic::Underrun`] and the mesh is still returned.
		pub fn read(chunk: &Chunk, cfg: &ImportCfg, diags: &mut Vec<Diagnostic>) -> Result<PhyMesh, C3ImportError> {
			let mut cur = ByteCursor::new(chunk.payload);

			let mut mesh = match PhyMesh::read_fields(&mut cur, chunk, cfg) {
				Ok(mesh) => mesh,
				Err(C3ImportError::TruncatedRead { source }) =>
					return Err(chunk.overrun(source.offset as u64 + source.requested as u64)),
				Err(e) => return Err(e),
			};

			let consumed = cur.position();
			if consumed < chunk.payload.len() {
				if cfg.flags.contains(ImportFlag::PROBE_TEXTURE) {
					mesh.texture = probe_texture(&cur);
				}

				diags.push(Diagnostic::Underrun {
					tag: chunk.tag,
					offset: chunk.offset,
					declared: chunk.payload.len(),
					consumed: consumed,
				});
			}

			if cfg.flags.contains(ImportFlag::CHECK_SKIN) {
				mesh.check_skin(chunk.offset, cfg, diags);
			}
			mesh.check_indices(chunk.offset, diags);

			Ok(mesh)
		}

		fn read_fields(cur: &mut ByteCursor, chunk: &Chunk, cfg: &ImportCfg) -> Result<PhyMesh, C3ImportError> {
			let name_len = cur.read_u32()? as usize;
			let name = cur.read_fixed_string(name_len)?;
			let blend_count = cur.read_u32()?;

			let normal_vertex_count = cur.read_u32()?;
			let alpha_vertex_count = cur.read_u32()?;
			let total_vertices = normal_vertex_count as u64 + alpha_vertex_count as u64;
			if total_vertices > cfg.max_vertices as u64 {
				return Err(C3ImportError::VertexLimit(total_vertices));
			}
			check_fits(cur, chunk, total_vertices.checked_mul(vertex_stride(blend_count)))?;

			let vertices = (0..total_vertices)
				.map(|_| Vertex::read(cur, blend_count))
				.collect::<Result<Vec<Vertex>, ReadError>>()?;

			let bounds = Bounds {
				min: cur.read_vec3()?,
				max: cur.read_vec3()?,
			};
			let bind_pose = cur.read_mat4_rows()?;

			let normal_triangle_count = cur.read_u32()?;
			let alpha_triangle_count = cur.read_u32()?;
			let total_triangles = normal_triangle_count as u64 + alpha_triangle_count as u64;
			if total_triangles > cfg.max_triangles as u64 {
				return Err(C3ImportError::TriangleLimit(total_triangles));
			}
			check_fits(cur, chunk, total_triangles.checked_mul(6))?;

			let mut triangles = Vec::with_capacity(total_triangles as usize);
			for _ in 0..total_triangles {
				triangles.push([cur.read_u16()?, cur.read_u16()?, cur.read_u16()?]);
			}

			Ok(PhyMesh {
				name: name,
				blend_count: blend_count,
				normal_vertex_count: normal_vertex_count,
				alpha_vertex_count: alpha_vertex_count,
				vertices: vertices,
				bounds: bounds,
				bind_pose: bind_pose,
				normal_triangle_count: normal_triangle_count,
				alpha_triangle_count: alpha_triangle_count,
				triangles: triangles,
				texture: None,
			})
		}

		fn check_skin(&self, offset: usize, cfg: &ImportCfg, diags: &mut Vec<Diagnostic>) {
			if self.blend_count == 0 {
				return;
			}

			for (i, v) in self.vertices.iter().enumerate() {
				let sum: f32 = v.bone_weights.iter().sum();
				if (sum - 1.0).abs() > cfg.weight_tolerance {
					diags.push(Diagnostic::WeightSum {
						offset: offset,
						vertex: i,
						sum: sum,
					});
				}

				if let Some(bone_count) = cfg.bone_count {
					for &bone in v.bone_indices.iter().filter(|&&b| b as u32 >= bone_count) {
						diags.push(Diagnostic::BoneIndex {
							offset: offset,
							vertex: i,
							bone: bone,
							bone_count: bone_count,
						});
					}
				}
			}
		}

		fn check_indices(&self, offset: usize, diags: &mut Vec<Diagnostic>) {
			let vertex_count = self.vertices.len();

			for (i, t) in self.triangles.iter().enumerate() {
				for &index in t.iter().filter(|&&x| x as usize >= vertex_count) {
					diags.push(Diagnostic::IndexRange {
						offset: offset,
						triangle: i,
						index: index,
						vertex_count: vertex_count,
					});
				}
			}
		}
	}

	/// Fails before any allocation when a counted array cannot fit in the rest of the chunk
	fn check_fits(cur: &ByteCursor, chunk: &Chunk, size: Option<u64>) -> Result<(), C3ImportError> {
		let required = size.and_then(|s| s.checked_add(cur.position() as u64));

		match required {
			Some(r) if r <= cur.len() as u64 => Ok(()),
			Some(r) => Err(chunk.overrun(r)),
			None => Err(chunk.overrun(u64::MAX)),
		}
	}

	/// Reads a u32 length-prefixed printable name without moving the caller's cursor
	fn probe_texture(cur: &ByteCursor) -> Option<String> {
		let mut cur = cur.clone();

		let len = cur.read_u32().ok()? as usize;
		if len == 0 || len > MAX_TEXTURE_NAME {
			return None;
		}

		let raw = cur.read_bytes(len).ok()?;
		if !raw.iter().all(|b| (0x20..0x7f).contains(b)) {
			return None;
		}

		Some(String::from_utf8_lossy(raw).into_owned())
	}
}
