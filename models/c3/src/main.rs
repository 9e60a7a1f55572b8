use clap::{
	Parser,
	ValueEnum
};

use std::{
	fs::read,
	path::PathBuf,
	process::ExitCode
};

use tracing_subscriber::EnvFilter;

use rgk_core::rtag4_str;

use rgk_models_c3::{
	maxfile::SizeConvention,
	model::C3Model,
	scan::{
		scan,
		AssetStatus,
		ScanError
	},
	ImportCfg
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Convention {
	/// Chunk sizes count the payload only
	Payload,
	/// Chunk sizes include the 8-byte chunk header
	Inclusive,
	/// Work the convention out from the data
	Probe,
}

#[derive(Parser)]
#[command(name = "c3dump")]
#[command(about = "Inspect C3 MAXFILE meshes", long_about = None)]
struct Cli {
	/// A .c3 file, or a directory to scan
	path: PathBuf,

	/// Dump every decoded field
	#[arg(short, long)]
	verbose: bool,

	#[arg(short, long, value_enum, default_value_t = Convention::Payload)]
	convention: Convention,

	/// Skeleton size to check bone indices against
	#[arg(short, long)]
	bones: Option<u32>,
}

impl Cli {
	fn cfg(&self) -> ImportCfg {
		ImportCfg {
			size_convention: match self.convention {
				Convention::Payload => Some(SizeConvention::PayloadOnly),
				Convention::Inclusive => Some(SizeConvention::HeaderInclusive),
				Convention::Probe => None,
			},
			bone_count: self.bones,
			..ImportCfg::default()
		}
	}
}

fn dump_file(cli: &Cli) -> Result<(), ScanError> {
	let buf = read(&cli.path)?;
	let model = C3Model::read(&buf, &cli.cfg())?;

	if cli.verbose {
		println!("{:#?}", model);
		return Ok(());
	}

	println!("{}: {:?} sizes, header {:?}", cli.path.display(), model.convention, model.header.reserved());
	for chunk in model.chunks.iter() {
		println!("  [{:#x}] {} {} bytes{}", chunk.offset, rtag4_str(chunk.tag), chunk.size,
			if chunk.decoded { "" } else { " (skipped)" });
	}

	for mesh in model.meshes.iter() {
		println!("mesh {:?}", mesh.name);
		println!("  blend count {} (stride {})", mesh.blend_count, mesh.stride());
		println!("  vertices {} + {} alpha", mesh.normal_vertex_count, mesh.alpha_vertex_count);
		println!("  triangles {} + {} alpha", mesh.normal_triangle_count, mesh.alpha_triangle_count);
		println!("  bounds {:?} .. {:?}", mesh.bounds.min, mesh.bounds.max);
		if let Some(texture) = &mesh.texture {
			println!("  texture {}", texture);
		}
	}

	for diag in model.diagnostics.iter() {
		println!("{}", diag);
	}

	Ok(())
}

fn scan_dir(cli: &Cli) -> Result<(), ScanError> {
	let reports = scan(&cli.path, &cli.cfg())?;

	for report in reports.iter() {
		println!("{}: {}", report.path.display(), report.status);
	}

	let with_mesh = reports.iter().filter(|r| matches!(r.status, AssetStatus::HasMesh { .. })).count();
	println!("{} of {} files have meshes", with_mesh, reports.len());

	Ok(())
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();
	let result = if cli.path.is_dir() { scan_dir(&cli) } else { dump_file(&cli) };

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{}: {}", cli.path.display(), e);
			ExitCode::FAILURE
		},
	}
}
