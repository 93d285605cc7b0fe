// Headless export: render a scene manifest to PNG without any UI.
//
// Usage:
//   coralscape export --scene scene.json --assets images/ --out exports/
//   coralscape export --scene scene.json --assets images/ --out exports/ --config editor.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use futures::executor::block_on;

use coralscape::compositor::Compositor;
use coralscape::config::EditorConfig;
use coralscape::export::{DirectorySink, Exporter};
use coralscape::loader::FsImageLoader;
use coralscape::scene::SceneManifest;
use coralscape::state::EditorContext;

/// CoralScape aquarium composition renderer.
#[derive(Parser, Debug)]
#[command(name = "coralscape", version, about = "Render CoralScape aquarium designs to PNG")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a scene at the base image's full resolution and save it
    Export {
        /// Scene manifest (JSON)
        #[arg(long, value_name = "FILE")]
        scene: PathBuf,

        /// Directory image references in the scene are resolved against
        #[arg(long, value_name = "DIR")]
        assets: PathBuf,

        /// Directory the PNG is written to
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Editor configuration (JSON); defaults apply to missing keys
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Export {
            scene,
            assets,
            out,
            config,
        } => export(scene, assets, out, config),
    }
}

fn export(scene: PathBuf, assets: PathBuf, out: PathBuf, config: Option<PathBuf>) -> ExitCode {
    let config = match config {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::default(),
    };

    let manifest = match SceneManifest::load(&scene) {
        Ok(manifest) => manifest,
        Err(err) => {
            log::error!("{}: {err}", scene.display());
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = EditorContext::new(config.clone());
    ctx.load_canvas(manifest.to_canvas(&config));

    let exporter = Exporter::new(Compositor::new(FsImageLoader::new(assets), config));
    let mut sink = DirectorySink::new(&out);
    match block_on(exporter.export(&mut ctx, &mut sink)) {
        Ok(artifact) => {
            println!("{}", out.join(&artifact.file_name).display());
            if artifact.skipped.is_empty() {
                ExitCode::SUCCESS
            } else {
                log::warn!("{} overlay(s) could not be drawn", artifact.skipped.len());
                ExitCode::from(2)
            }
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
