#[cfg(feature = "import")]
pub mod dispatch;
#[cfg(feature = "export")]
pub mod export;
pub mod import;
pub mod maxfile;
#[cfg(feature = "import")]
pub mod model;
pub mod phy;
#[cfg(feature = "scan")]
pub mod scan;

use bitflags::bitflags;

#[cfg(feature = "import")]
use rgk_core::scene::{
	Mesh,
	Node,
	NodeData,
	ObjRef,
	Scene
};

pub use import::{
	C3ImportError,
	Diagnostic
};
pub use maxfile::SizeConvention;
#[cfg(feature = "import")]
pub use model::{
	C3Model,
	decode
};
pub use phy::PhyMesh;

bitflags! {
	pub struct ImportFlag: u32 {
		/// Report bone weights that do not sum to 1 and out-of-range bone indices
		const CHECK_SKIN = 1;
		/// Look for a length-prefixed texture name in bytes left after the triangles
		const PROBE_TEXTURE = 2;
		/// Join every mesh of a container into a single geometry node
		const MERGE_MESHES = 4;
		/// Keep meshes decoded so far when a later PHY chunk fails
		const KEEP_PARTIAL = 8;
	}
}

impl Default for ImportFlag {
	fn default() -> Self {
		ImportFlag::CHECK_SKIN | ImportFlag::PROBE_TEXTURE
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportCfg {
	pub flags: ImportFlag,
	/// `None` resolves the convention from the data with [`SizeConvention::probe`]
	pub size_convention: Option<SizeConvention>,
	/// Skeleton size to check bone indices against, when known
	pub bone_count: Option<u32>,
	pub weight_tolerance: f32,
	pub max_vertices: u32,
	pub max_triangles: u32,
}

impl Default for ImportCfg {
	fn default() -> Self {
		Self {
			flags: ImportFlag::default(),
			size_convention: Some(SizeConvention::PayloadOnly),
			bone_count: None,
			weight_tolerance: 0.01,
			max_vertices: 100_000,
			max_triangles: 100_000,
		}
	}
}

/// Decodes a MAXFILE buffer into a scene with one geometry node per PHY mesh
#[cfg(feature = "import")]
pub fn read(buf: &[u8], cfg: &ImportCfg) -> Result<Scene, C3ImportError> {
	let model = C3Model::read(buf, cfg)?;
	if model.meshes.is_empty() {
		return Err(C3ImportError::NoMesh);
	}

	let mut root = Node::new(ObjRef::Name(model.meshes[0].name.clone()), None);

	if cfg.flags.contains(ImportFlag::MERGE_MESHES) {
		// Each part is posed into the shared space, the root stays at identity
		let mut merged = Mesh::default();
		for phy in model.meshes.iter() {
			merged.append(phy.to_posed_mesh());
		}

		root.data = NodeData::Geometry(merged);
	} else {
		for (i, phy) in model.meshes.iter().enumerate() {
			let mut node = Node::new(ObjRef::Name(phy.name.clone()), Some(0));
			if phy.name.is_empty() {
				node.id = ObjRef::Number(i as u32);
			}

			node.transform = phy.bind_pose;
			node.data = NodeData::Geometry(phy.to_mesh());
			root.children.push(node);
		}
	}

	Ok(Scene::new(root))
}

#[cfg(all(test, feature = "import", feature = "export"))]
mod tests {
	use rgk_core::scene::{
		Bounds,
		Face,
		NodeData
	};

	use ultraviolet::{
		mat::Mat4,
		vec::{
			Vec3,
			Vec4
		}
	};

	use crate::{
		export::MaxfileWriter,
		phy::tests::single_vertex_mesh
	};
	use super::*;

	fn two_meshes() -> Vec<u8> {
		let mut first = single_vertex_mesh();
		first.name = "body".to_string();
		first.triangles = vec![[0, 0, 0]];
		first.normal_triangle_count = 1;

		let mut second = first.clone();
		second.name = "arm".to_string();
		second.bind_pose = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));

		let mut writer = MaxfileWriter::new(SizeConvention::PayloadOnly);
		writer.phy(&first).unwrap();
		writer.phy(&second).unwrap();
		writer.finish()
	}

	#[test]
	fn test_read_scene() {
		let scene = read(&two_meshes(), &ImportCfg::default()).unwrap();

		assert_eq!(2, scene.root.children.len());
		assert_eq!(ObjRef::Name("arm".to_string()), scene.root.children[1].id);
		assert_eq!(Vec4::new(0.0, 5.0, 0.0, 1.0), scene.root.children[1].transform.cols[3]);

		let meshes = scene.meshes();
		assert_eq!(2, meshes.len());
		assert_eq!(Face::Triangle([0, 0, 0]), meshes[1].faces[0]);
	}

	#[test]
	fn test_merge_meshes() {
		let cfg = ImportCfg {
			flags: ImportFlag::default() | ImportFlag::MERGE_MESHES,
			..ImportCfg::default()
		};

		let scene = read(&two_meshes(), &cfg).unwrap();
		assert!(scene.root.children.is_empty());
		assert_eq!(Mat4::identity(), scene.root.transform);

		if let NodeData::Geometry(mesh) = &scene.root.data {
			assert_eq!(2, mesh.vertices.len());
			assert_eq!(vec![Face::Triangle([0, 0, 0]), Face::Triangle([1, 1, 1])], mesh.faces);
			assert!(mesh.dangling_faces().is_empty());

			// The arm sits 5 units up in its bind pose
			assert_eq!(Vec3::new(1.0, 2.0, 3.0), mesh.vertices[0].position);
			assert_eq!(Vec3::new(1.0, 7.0, 3.0), mesh.vertices[1].position);
			assert_eq!(Some(Vec3::new(0.0, 1.0, 0.0)), mesh.vertices[1].normal);
			assert_eq!(Some(Bounds { min: Vec3::zero(), max: Vec3::new(1.0, 7.0, 3.0) }), mesh.bounds);
		} else {
			panic!("merged scene has no geometry");
		}
	}

	#[test]
	fn test_read_no_mesh() {
		let buf = MaxfileWriter::new(SizeConvention::PayloadOnly).finish();
		assert_eq!(C3ImportError::NoMesh, read(&buf, &ImportCfg::default()).unwrap_err());
	}
}
