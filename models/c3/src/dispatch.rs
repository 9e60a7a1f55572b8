use std::collections::HashMap;

use crate::{
	import::{
		C3ImportError,
		Diagnostic
	},
	maxfile::{
		Chunk,
		MAXF,
		MOTI,
		MOTN,
		PHY,
		PHY4,
		PHYS,
		PTCL
	},
	phy::PhyMesh,
	ImportCfg
};

/// What the dispatcher does with a registered tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
	/// Decode with the PHY mesh layout
	Phy,
	/// Known chunk, skipped without a diagnostic
	Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChunkData {
	Phy(PhyMesh),
	/// Payload left uninterpreted
	Opaque {
		tag: u32,
		size: usize,
	},
}

#[derive(Clone, Debug)]
pub struct Dispatcher {
	kinds: HashMap<u32, ChunkKind>,
}

impl Default for Dispatcher {
	fn default() -> Self {
		let mut dispatcher = Dispatcher::empty();
		dispatcher.register(PHY, ChunkKind::Phy);
		dispatcher.register(PHYS, ChunkKind::Phy);

		// Motion and particle data, plus the 40-byte-vertex PHY4 variant
		for tag in [MOTI, MOTN, PTCL, MAXF, PHY4] {
			dispatcher.register(tag, ChunkKind::Ignored);
		}

		dispatcher
	}
}

impl Dispatcher {
	/// A dispatcher that treats every tag as unknown
	pub fn empty() -> Dispatcher {
		Dispatcher {
			kinds: HashMap::new(),
		}
	}

	/// Registers `tag`, returning the kind it replaced
	pub fn register(&mut self, tag: u32, kind: ChunkKind) -> Option<ChunkKind> {
		self.kinds.insert(tag, kind)
	}

	pub fn unregister(&mut self, tag: u32) -> Option<ChunkKind> {
		self.kinds.remove(&tag)
	}

	pub fn kind(&self, tag: u32) -> Option<ChunkKind> {
		self.kinds.get(&tag).copied()
	}

	/// Routes one chunk. The chunk's payload window is already bounded by the
	/// container walk, so skipping never recomputes a boundary.
	pub fn dispatch(&self, chunk: &Chunk, cfg: &ImportCfg, diags: &mut Vec<Diagnostic>) -> Result<ChunkData, C3ImportError> {
		match self.kind(chunk.tag) {
			Some(ChunkKind::Phy) => Ok(ChunkData::Phy(PhyMesh::read(chunk, cfg, diags)?)),
			Some(ChunkKind::Ignored) => Ok(ChunkData::Opaque {
				tag: chunk.tag,
				size: chunk.payload.len(),
			}),
			None => {
				diags.push(Diagnostic::SkippedChunk {
					tag: chunk.tag,
					offset: chunk.offset,
					size: chunk.payload.len(),
				});

				Ok(ChunkData::Opaque {
					tag: chunk.tag,
					size: chunk.payload.len(),
				})
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use rgk_core::rtag4;

	use ultraviolet::vec::Vec3;

	use crate::phy::tests::{
		payload,
		single_vertex_mesh
	};
	use super::*;

	fn chunk<'a>(tag: u32, payload: &'a [u8]) -> Chunk<'a> {
		Chunk {
			tag: tag,
			size: payload.len() as u32,
			offset: 40,
			payload: payload,
		}
	}

	#[test]
	fn test_default_registrations() {
		let dispatcher = Dispatcher::default();
		assert_eq!(Some(ChunkKind::Phy), dispatcher.kind(rtag4!(b"PHY ")));
		assert_eq!(Some(ChunkKind::Phy), dispatcher.kind(rtag4!(b"PHYS")));
		assert_eq!(Some(ChunkKind::Ignored), dispatcher.kind(rtag4!(b"MOTI")));
		assert_eq!(None, dispatcher.kind(rtag4!(b"XTRA")));
	}

	#[test]
	fn test_dispatch_phy() {
		let data = payload("v_body", 0, [1, 0], &[(Vec3::new(1.0, 2.0, 3.0), &[], &[])], [0, 0], &[]);
		let mut diags = vec![];

		let out = Dispatcher::default().dispatch(&chunk(PHYS, &data), &ImportCfg::default(), &mut diags);
		assert_eq!(Ok(ChunkData::Phy(single_vertex_mesh())), out);
		assert!(diags.is_empty());
	}

	#[test]
	fn test_unknown_tag_skipped() {
		let xtra = rtag4!(b"XTRA");
		let mut diags = vec![];

		let out = Dispatcher::default().dispatch(&chunk(xtra, &[0; 12]), &ImportCfg::default(), &mut diags);
		assert_eq!(Ok(ChunkData::Opaque { tag: xtra, size: 12 }), out);
		assert_eq!(vec![Diagnostic::SkippedChunk { tag: xtra, offset: 40, size: 12 }], diags);
	}

	#[test]
	fn test_ignored_tag_is_silent() {
		let mut diags = vec![];
		let out = Dispatcher::default().dispatch(&chunk(MOTN, &[1, 2, 3]), &ImportCfg::default(), &mut diags);

		assert_eq!(Ok(ChunkData::Opaque { tag: MOTN, size: 3 }), out);
		assert!(diags.is_empty());
	}

	#[test]
	fn test_register_alias() {
		let data = payload("v_body", 0, [1, 0], &[(Vec3::new(1.0, 2.0, 3.0), &[], &[])], [0, 0], &[]);
		let mut dispatcher = Dispatcher::default();
		let mut diags = vec![];

		assert_eq!(Some(ChunkKind::Phy), dispatcher.unregister(PHY));
		assert!(matches!(dispatcher.dispatch(&chunk(PHY, &data), &ImportCfg::default(), &mut diags),
			Ok(ChunkData::Opaque { .. })));
		assert_eq!(1, diags.len());

		assert_eq!(None, dispatcher.register(rtag4!(b"MESH"), ChunkKind::Phy));
		assert!(matches!(dispatcher.dispatch(&chunk(rtag4!(b"MESH"), &data), &ImportCfg::default(), &mut diags),
			Ok(ChunkData::Phy(_))));
	}
}
