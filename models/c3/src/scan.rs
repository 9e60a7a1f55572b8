use rayon::prelude::*;

use std::{
	fmt::{
		Display,
		Formatter,
		self
	},
	fs,
	io,
	path::{
		Path,
		PathBuf
	},
	sync::Mutex
};

use thiserror::Error;
use walkdir::WalkDir;

use crate::{
	import::C3ImportError,
	model::C3Model,
	ImportCfg
};

#[derive(Error, Debug)]
pub enum ScanError {
	#[error("I/O error: {source}")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Directory walk failed: {source}")]
	Walk {
		#[from]
		source: walkdir::Error,
	},
	#[error("{source}")]
	Import {
		#[from]
		source: C3ImportError,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssetStatus {
	HasMesh {
		meshes: usize,
		vertices: usize,
		triangles: usize,
		diagnostics: usize,
	},
	NoMesh,
	Failed(String),
}

impl Display for AssetStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			AssetStatus::HasMesh { meshes, vertices, triangles, diagnostics } =>
				write!(f, "HAS MESH ({} meshes, {} vertices, {} triangles, {} diagnostics)",
					meshes, vertices, triangles, diagnostics),
			AssetStatus::NoMesh => write!(f, "NO MESH"),
			AssetStatus::Failed(reason) => write!(f, "FAILED: {}", reason),
		}
	}
}

impl From<&Result<C3Model, ScanError>> for AssetStatus {
	fn from(result: &Result<C3Model, ScanError>) -> Self {
		match result {
			Ok(model) if model.meshes.is_empty() => AssetStatus::NoMesh,
			Ok(model) => AssetStatus::HasMesh {
				meshes: model.meshes.len(),
				vertices: model.meshes.iter().map(|m| m.vertices.len()).sum(),
				triangles: model.meshes.iter().map(|m| m.triangles.len()).sum(),
				diagnostics: model.diagnostics.len(),
			},
			Err(e) => AssetStatus::Failed(e.to_string()),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetReport {
	pub path: PathBuf,
	pub status: AssetStatus,
}

/// Files the scanner picks up: `*.c3`, any case
pub fn is_c3_path(path: &Path) -> bool {
	path.extension()
		.map(|ext| ext.eq_ignore_ascii_case("c3"))
		.unwrap_or(false)
}

pub fn decode_file(path: &Path, cfg: &ImportCfg) -> Result<C3Model, ScanError> {
	let buf = fs::read(path)?;
	Ok(C3Model::read(&buf, cfg)?)
}

fn asset_paths(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
	fs::metadata(root)?;

	let mut paths = vec![];
	for entry in WalkDir::new(root).sort_by_file_name() {
		match entry {
			Ok(entry) if entry.file_type().is_file() && is_c3_path(entry.path()) =>
				paths.push(entry.into_path()),
			Ok(_) => {},
			Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
		}
	}

	Ok(paths)
}

/// Decodes every `.c3` file below `root` in parallel, handing each result to `f`.
/// Returns the number of files visited.
pub fn for_each_asset<F>(root: &Path, cfg: &ImportCfg, f: F) -> Result<usize, ScanError>
where
	F: Fn(&Path, Result<C3Model, ScanError>) + Send + Sync,
{
	let paths = asset_paths(root)?;
	tracing::debug!("Found {} C3 files in {}", paths.len(), root.display());

	paths.par_iter().for_each(|path| {
		let result = decode_file(path, cfg);
		match &result {
			Ok(model) => tracing::debug!("{}: {} meshes", path.display(), model.meshes.len()),
			Err(e) => tracing::warn!("{}: {}", path.display(), e),
		}

		f(path, result);
	});

	Ok(paths.len())
}

/// Scans `root` and returns one report per file, ordered by path
pub fn scan(root: &Path, cfg: &ImportCfg) -> Result<Vec<AssetReport>, ScanError> {
	let reports = Mutex::new(vec![]);

	for_each_asset(root, cfg, |path, result| {
		let report = AssetReport {
			path: path.to_path_buf(),
			status: AssetStatus::from(&result),
		};

		if let Ok(mut reports) = reports.lock() {
			reports.push(report);
		}
	})?;

	let mut reports = reports.into_inner().unwrap_or_else(|e| e.into_inner());
	reports.sort_by(|a, b| a.path.cmp(&b.path));

	let with_mesh = reports.iter().filter(|r| matches!(r.status, AssetStatus::HasMesh { .. })).count();
	tracing::info!("Scanned {} files, {} with meshes", reports.len(), with_mesh);

	Ok(reports)
}

#[cfg(all(test, feature = "export"))]
mod tests {
	use std::fs;

	use crate::{
		export::MaxfileWriter,
		maxfile::{
			SizeConvention,
			MOTI
		},
		phy::tests::single_vertex_mesh
	};
	use super::*;

	#[test]
	fn test_is_c3_path() {
		assert!(is_c3_path(Path::new("data/Body.C3")));
		assert!(is_c3_path(Path::new("a.c3")));
		assert!(!is_c3_path(Path::new("a.c3.bak")));
		assert!(!is_c3_path(Path::new("c3")));
	}

	#[test]
	fn test_scan_isolates_failures() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path();

		let mut good = MaxfileWriter::new(SizeConvention::PayloadOnly);
		good.phy(&single_vertex_mesh()).unwrap();
		fs::write(root.join("a_good.c3"), good.finish()).unwrap();

		fs::write(root.join("b_bad.c3"), b"MAXFILE C3 00001PHY \xff\xff\xff\xff").unwrap();

		let mut motion = MaxfileWriter::new(SizeConvention::PayloadOnly);
		motion.chunk(MOTI, &[0; 8]).unwrap();
		fs::create_dir(root.join("sub")).unwrap();
		fs::write(root.join("sub").join("c_motion.c3"), motion.finish()).unwrap();

		fs::write(root.join("notes.txt"), b"not an asset").unwrap();

		let reports = scan(root, &ImportCfg::default()).unwrap();
		assert_eq!(3, reports.len());

		assert_eq!(AssetStatus::HasMesh { meshes: 1, vertices: 1, triangles: 0, diagnostics: 0 }, reports[0].status);
		assert!(matches!(&reports[1].status, AssetStatus::Failed(reason) if reason.starts_with("Truncated data")));
		assert_eq!(AssetStatus::NoMesh, reports[2].status);
		assert_eq!("NO MESH", reports[2].status.to_string());
	}

	#[test]
	fn test_for_each_asset_counts() {
		let dir = tempfile::tempdir().unwrap();
		for i in 0..4 {
			fs::write(dir.path().join(format!("{}.c3", i)), b"junk").unwrap();
		}

		let failures = Mutex::new(0);
		let visited = for_each_asset(dir.path(), &ImportCfg::default(), |_, result| {
			if let Err(ScanError::Import { source: C3ImportError::Magic(_) }) = result {
				*failures.lock().unwrap() += 1;
			}
		}).unwrap();

		assert_eq!(4, visited);
		assert_eq!(4, *failures.lock().unwrap());
	}

	#[test]
	fn test_missing_root() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(scan(&dir.path().join("nope"), &ImportCfg::default()), Err(ScanError::IO { .. })));
	}
}
