use ultraviolet::{
	mat::Mat4,
	vec::{
		Vec2,
		Vec3
	}
};

/// Node identification type
#[derive(Clone, Debug, PartialEq)]
pub enum ObjRef {
	Name(String),
	Number(u32),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
	Geometry(Mesh),
	Null,
}

/// Base type of the 3D environment
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: ObjRef,
	pub parent: Option<usize>,
	pub children: Vec<Node>,
	pub data: NodeData,
	/// Rest-state placement relative to the parent
	pub transform: Mat4,
}

impl Node {
	pub fn new(id: ObjRef, parent: Option<usize>) -> Node {
		Node {
			id: id,
			parent: parent,
			children: vec![],
			data: NodeData::Null,
			transform: Mat4::identity(),
		}
	}
}

/// Influence of a single bone on a vertex
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneWeight {
	pub bone: usize,
	pub weight: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
	pub position: Vec3,
	pub normal: Option<Vec3>,
	pub uv: Vec<Vec2>,
	pub weights: Vec<BoneWeight>,
}

impl Vertex {
	pub fn new(position: Vec3) -> Vertex {
		Vertex {
			position: position,
			normal: None,
			uv: vec![],
			weights: vec![],
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Face {
	Triangle([usize; 3]),
	Quad([usize; 4]),
	Ngon(Vec<usize>),
}

impl Face {
	pub fn indices(&self) -> &[usize] {
		match self {
			Face::Triangle(t) => &t[..],
			Face::Quad(q) => &q[..],
			Face::Ngon(n) => &n[..],
		}
	}
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min: Vec3,
	pub max: Vec3,
}

impl Bounds {
	/// Smallest box holding both `self` and `other`
	pub fn union(&self, other: &Bounds) -> Bounds {
		Bounds {
			min: Vec3::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y), self.min.z.min(other.min.z)),
			max: Vec3::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y), self.max.z.max(other.max.z)),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
	pub vertices: Vec<Vertex>,
	pub faces: Vec<Face>,
	pub bounds: Option<Bounds>,
}

impl Mesh {
	/// Appends another mesh, rebasing its face indices past the current vertices
	pub fn append(&mut self, other: Mesh) {
		let base = self.vertices.len();

		self.faces.extend(other.faces.into_iter().map(|f| match f {
			Face::Triangle(t) => Face::Triangle(t.map(|i| i + base)),
			Face::Quad(q) => Face::Quad(q.map(|i| i + base)),
			Face::Ngon(n) => Face::Ngon(n.into_iter().map(|i| i + base).collect()),
		}));
		self.vertices.extend(other.vertices);

		self.bounds = match (self.bounds, other.bounds) {
			(Some(a), Some(b)) => Some(a.union(&b)),
			(a, b) => a.or(b),
		};
	}

	/// Returns a list of face indices referencing a vertex that does not exist
	pub fn dangling_faces(&self) -> Vec<usize> {
		self.faces.iter()
			.enumerate()
			.filter(|(_, f)| f.indices().iter().any(|i| *i >= self.vertices.len()))
			.map(|(i, _)| i)
			.collect()
	}
}

/// Top level of the 3D environment
#[derive(Clone, Debug)]
pub struct Scene {
	pub root: Node,
}

impl Scene {
	pub fn new(root: Node) -> Scene {
		Scene {
			root: root,
		}
	}

	/// Iterates every geometry node below the root, depth first
	pub fn meshes(&self) -> Vec<&Mesh> {
		fn walk<'a>(node: &'a Node, out: &mut Vec<&'a Mesh>) {
			if let NodeData::Geometry(mesh) = &node.data {
				out.push(mesh);
			}
			for child in node.children.iter() {
				walk(child, out);
			}
		}

		let mut out = vec![];
		walk(&self.root, &mut out);
		out
	}
}
