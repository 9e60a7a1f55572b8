use std::fmt::{
	Display,
	Formatter,
	self
};

use thiserror::Error;

use rgk_core::{
	cursor::ReadError,
	rtag4_str
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum C3ImportError {
	#[error("Not a C3 MAXFILE: {0:?}")]
	Magic(String),
	#[error("Truncated data: {source}")]
	TruncatedRead {
		#[from]
		source: ReadError,
	},
	#[error("Truncated chunk header at offset {offset}: only {remaining} bytes left")]
	TruncatedChunkHeader {
		offset: usize,
		remaining: usize,
	},
	#[error("Invalid declared size {size} for chunk {tag} at offset {offset}")]
	ChunkSize {
		tag: String,
		offset: usize,
		size: u32,
	},
	#[error("Chunk {tag} at offset {offset} overrun: decoding needs {required} bytes, {declared} declared")]
	ChunkOverrun {
		tag: String,
		offset: usize,
		declared: usize,
		required: u64,
	},
	#[error("Vertex count over the configured limit: {0}")]
	VertexLimit(u64),
	#[error("Triangle count over the configured limit: {0}")]
	TriangleLimit(u64),
	#[error("No chunk size convention walks this container cleanly")]
	UnresolvedConvention,
	#[error("Both chunk size conventions walk this container cleanly")]
	AmbiguousConvention,
	#[error("Container holds no PHY chunk")]
	NoMesh,
}

/// Non-fatal findings reported alongside a successful decode.
/// Every variant carries the header offset of the chunk it concerns.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
	/// Decoding finished before the declared end of the chunk
	Underrun {
		tag: u32,
		offset: usize,
		declared: usize,
		consumed: usize,
	},
	/// Chunk with no registered decoder
	SkippedChunk {
		tag: u32,
		offset: usize,
		size: usize,
	},
	/// Bone weights of a vertex do not sum to 1
	WeightSum {
		offset: usize,
		vertex: usize,
		sum: f32,
	},
	/// Bone index outside the configured skeleton
	BoneIndex {
		offset: usize,
		vertex: usize,
		bone: u8,
		bone_count: u32,
	},
	/// Triangle referencing a vertex past the end of the vertex list
	IndexRange {
		offset: usize,
		triangle: usize,
		index: u16,
		vertex_count: usize,
	},
	/// Decoder failure tolerated because an earlier mesh was already loaded
	ChunkFailed {
		tag: u32,
		offset: usize,
		error: C3ImportError,
	},
}

impl Diagnostic {
	/// Offset of the chunk header this diagnostic belongs to
	pub fn offset(&self) -> usize {
		match *self {
			Diagnostic::Underrun { offset, .. } |
			Diagnostic::SkippedChunk { offset, .. } |
			Diagnostic::WeightSum { offset, .. } |
			Diagnostic::BoneIndex { offset, .. } |
			Diagnostic::IndexRange { offset, .. } |
			Diagnostic::ChunkFailed { offset, .. } => offset,
		}
	}

	/// Number of undecoded bytes left in the chunk, if this is an underrun
	pub fn trailing(&self) -> Option<usize> {
		match *self {
			Diagnostic::Underrun { declared, consumed, .. } => Some(declared - consumed),
			_ => None,
		}
	}
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Diagnostic::Underrun { tag, offset, declared, consumed } =>
				write!(f, "[{:#x}] {}: {} of {} bytes decoded, {} trailing", offset, rtag4_str(*tag),
					consumed, declared, declared - consumed),
			Diagnostic::SkippedChunk { tag, offset, size } =>
				write!(f, "[{:#x}] {}: unknown chunk, {} bytes skipped", offset, rtag4_str(*tag), size),
			Diagnostic::WeightSum { offset, vertex, sum } =>
				write!(f, "[{:#x}] vertex {}: bone weights sum to {}", offset, vertex, sum),
			Diagnostic::BoneIndex { offset, vertex, bone, bone_count } =>
				write!(f, "[{:#x}] vertex {}: bone {} outside skeleton of {}", offset, vertex, bone, bone_count),
			Diagnostic::IndexRange { offset, triangle, index, vertex_count } =>
				write!(f, "[{:#x}] triangle {}: index {} past {} vertices", offset, triangle, index, vertex_count),
			Diagnostic::ChunkFailed { tag, offset, error } =>
				write!(f, "[{:#x}] {}: ignored after earlier mesh: {}", offset, rtag4_str(*tag), error),
		}
	}
}
