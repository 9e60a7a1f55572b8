use crate::{
	dispatch::{
		ChunkData,
		ChunkKind,
		Dispatcher
	},
	import::{
		C3ImportError,
		Diagnostic
	},
	maxfile::{
		Header,
		Maxfile,
		SizeConvention
	},
	phy::PhyMesh,
	ImportCfg,
	ImportFlag
};

/// Position and size of a chunk seen during the walk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkInfo {
	pub tag: u32,
	pub offset: usize,
	pub size: usize,
	pub decoded: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct C3Model {
	pub header: Header,
	pub convention: SizeConvention,
	pub meshes: Vec<PhyMesh>,
	pub chunks: Vec<ChunkInfo>,
	pub diagnostics: Vec<Diagnostic>,
}

impl C3Model {
	pub fn read(buf: &[u8], cfg: &ImportCfg) -> Result<C3Model, C3ImportError> {
		C3Model::read_with(buf, cfg, &Dispatcher::default())
	}

	/// Decodes every chunk of the container through `dispatcher`
	pub fn read_with(buf: &[u8], cfg: &ImportCfg, dispatcher: &Dispatcher) -> Result<C3Model, C3ImportError> {
		let convention = match cfg.size_convention {
			Some(c) => c,
			None => SizeConvention::probe(buf)?,
		};

		let file = Maxfile::read(buf, convention)?;
		let mut model = C3Model {
			header: file.header,
			convention: convention,
			meshes: vec![],
			chunks: vec![],
			diagnostics: vec![],
		};

		for chunk in file.chunks() {
			let chunk = chunk?;
			let mut diags = vec![];

			let decoded = match dispatcher.dispatch(&chunk, cfg, &mut diags) {
				Ok(ChunkData::Phy(mesh)) => {
					model.meshes.push(mesh);
					true
				},
				Ok(ChunkData::Opaque { .. }) => false,
				Err(e) => {
					let tolerated = cfg.flags.contains(ImportFlag::KEEP_PARTIAL) &&
						!model.meshes.is_empty() &&
						dispatcher.kind(chunk.tag) == Some(ChunkKind::Phy);
					if !tolerated {
						return Err(e);
					}

					diags.push(Diagnostic::ChunkFailed {
						tag: chunk.tag,
						offset: chunk.offset,
						error: e,
					});
					false
				},
			};

			model.diagnostics.append(&mut diags);
			model.chunks.push(ChunkInfo {
				tag: chunk.tag,
				offset: chunk.offset,
				size: chunk.payload.len(),
				decoded: decoded,
			});
		}

		Ok(model)
	}

	/// Chunks that were walked over without being decoded
	pub fn skipped(&self) -> impl Iterator<Item = &ChunkInfo> {
		self.chunks.iter().filter(|c| !c.decoded)
	}
}

/// Decodes the first PHY mesh of a container with the default configuration
pub fn decode(buf: &[u8]) -> Result<PhyMesh, C3ImportError> {
	C3Model::read(buf, &ImportCfg::default())?
		.meshes
		.into_iter()
		.next()
		.ok_or(C3ImportError::NoMesh)
}
