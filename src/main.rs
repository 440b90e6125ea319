//! slx-backport - retarget Simulink containers to an older release

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser};
use slx_backport::convert::TreeEvent;
use slx_backport::{Converter, Release};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slx-backport")]
#[command(author, version, about = "Rewrite .slx/.sldd/.mldatx files so an older release opens them")]
struct Cli {
    /// Convert every container below PATH
    #[arg(short, long)]
    directory: bool,

    #[command(flatten)]
    release: ReleaseFlags,

    /// Container file, or directory with --directory
    path: PathBuf,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ReleaseFlags {
    /// Target R2022a
    #[arg(long)]
    r2022a: bool,
    /// Target R2022b
    #[arg(long)]
    r2022b: bool,
    /// Target R2023a
    #[arg(long)]
    r2023a: bool,
    /// Target R2023b
    #[arg(long)]
    r2023b: bool,
    /// Target R2024a
    #[arg(long)]
    r2024a: bool,
    /// Target R2024b
    #[arg(long)]
    r2024b: bool,
}

impl ReleaseFlags {
    fn selected(&self) -> Option<Release> {
        let flags = [
            (self.r2022a, Release::R2022a),
            (self.r2022b, Release::R2022b),
            (self.r2023a, Release::R2023a),
            (self.r2023b, Release::R2023b),
            (self.r2024a, Release::R2024a),
            (self.r2024b, Release::R2024b),
        ];
        flags.into_iter().find_map(|(set, release)| set.then_some(release))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(release) = cli.release.selected() else {
        eprintln!("Error: no target release selected");
        return ExitCode::FAILURE;
    };
    let converter = Converter::default();

    if cli.directory {
        convert_directory(&converter, &cli.path, release)
    } else {
        convert_file(&converter, &cli.path, release)
    }
}

fn convert_file(converter: &Converter, path: &Path, release: Release) -> ExitCode {
    if path.is_dir() {
        eprintln!("Error: {} is a directory; use -d to convert a directory tree", path.display());
        return ExitCode::FAILURE;
    }
    match converter.convert_one(path, &release.token()) {
        Ok(output) => {
            println!("Created: {}", output.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn convert_directory(converter: &Converter, root: &Path, release: Release) -> ExitCode {
    let result = converter.convert_tree_with(root, &release.token(), |event| match event {
        TreeEvent::Started(path) => println!("Processing: {}", path.display()),
        TreeEvent::Finished(conversion) => match &conversion.outcome {
            Ok(output) => println!("Created: {}", output.display()),
            Err(e) => eprintln!("Error processing {}: {e}", conversion.path.display()),
        },
    });

    match result {
        Ok(conversions) if conversions.iter().all(|c| c.is_success()) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}
