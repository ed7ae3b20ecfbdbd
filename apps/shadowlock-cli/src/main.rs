use anyhow::Context;
use clap::{Parser, Subcommand};
use shadowlock_assets::{AssetStore, assimp};
use shadowlock_input::Action;
use shadowlock_kernel::{Puzzle, PuzzleConfig};
use shadowlock_render::{DebugTextRenderer, FramePlan, RenderView, Renderer};
use shadowlock_scene::{SceneComposer, StaticMeshes};
use shadowlock_tools::PuzzleInspector;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shadowlock-cli", about = "CLI tool for shadowlock puzzles")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Evaluate a set of control values against the puzzle targets
    Check {
        /// Light position along the room diagonal
        #[arg(long, default_value = "10.0")]
        light_x: f64,
        /// Shape rotation about X, radians
        #[arg(long, default_value = "0.0")]
        rot_x: f64,
        /// Shape rotation about Z, radians
        #[arg(long, default_value = "0.0")]
        rot_z: f64,
        /// Leave the shape unattached, as if still loading
        #[arg(long)]
        pending_shape: bool,
        /// Optional YAML puzzle config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load an Assimp JSON mesh and print its statistics
    Mesh {
        path: PathBuf,
    },
    /// Compose the scene and print a text dump of each layer
    Describe {
        /// Directory holding dodec.json and temple.json
        #[arg(long, default_value = "./assets")]
        assets_dir: PathBuf,
        /// Optional YAML puzzle config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PuzzleConfig> {
    match path {
        Some(path) => PuzzleConfig::load(path)
            .with_context(|| format!("load puzzle config {}", path.display())),
        None => Ok(PuzzleConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("shadowlock-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", shadowlock_input::crate_info());
            println!("kernel: {}", shadowlock_kernel::crate_info());
            println!("assets: {}", shadowlock_assets::crate_info());
            println!("scene: {}", shadowlock_scene::crate_info());
            println!("render: {}", shadowlock_render::crate_info());
            println!("tools: {}", shadowlock_tools::crate_info());
        }
        Commands::Check {
            light_x,
            rot_x,
            rot_z,
            pending_shape,
            config,
        } => {
            let mut puzzle = Puzzle::new(load_config(config.as_deref())?);
            for action in [
                Action::SetLightPosition(light_x),
                Action::SetShapeRotationX(rot_x),
                Action::SetShapeRotationZ(rot_z),
            ] {
                puzzle.apply(&action);
            }
            if !pending_shape {
                puzzle.attach_shape();
            }

            let outcome = puzzle.check();
            println!("{}", PuzzleInspector::summary(&puzzle));
            for info in PuzzleInspector::conditions(&puzzle) {
                println!("  {info}");
            }
            if outcome.just_solved {
                println!("Solved: the door slides open.");
            }
        }
        Commands::Mesh { path } => {
            let mesh = assimp::load_file(&path)
                .with_context(|| format!("load mesh {}", path.display()))?;
            println!("Mesh: {}", mesh.name);
            println!("  vertices:  {}", mesh.vertex_count());
            println!("  triangles: {}", mesh.triangle_count());
            match mesh.bounds() {
                Some((min, max)) => println!(
                    "  bounds:    ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                    min[0], min[1], min[2], max[0], max[1], max[2]
                ),
                None => println!("  bounds:    empty"),
            }
        }
        Commands::Describe { assets_dir, config } => {
            let config = load_config(config.as_deref())?;
            let mut assets = AssetStore::new();
            let meshes = StaticMeshes::register(&mut assets);
            let mut composer = SceneComposer::new(&config, &meshes)?;
            let mut puzzle = Puzzle::new(config);

            let shape_path = assets_dir.join("dodec.json");
            if shape_path.exists() {
                let id = assets.import_assimp_json(&shape_path)?;
                puzzle.attach_shape();
                composer.attach_shape(id, puzzle.state())?;
            } else {
                tracing::warn!("{} not found, shape left out", shape_path.display());
            }
            let room_path = assets_dir.join("temple.json");
            if room_path.exists() {
                let id = assets.import_assimp_json(&room_path)?;
                composer.attach_room(id)?;
            } else {
                tracing::warn!("{} not found, room left out", room_path.display());
            }
            composer.sync(puzzle.state());

            let text = DebugTextRenderer::new().render(
                composer.stage(),
                &RenderView::default(),
                &FramePlan::standard(),
            );
            print!("{text}");
            println!("{}", PuzzleInspector::summary(&puzzle));
        }
    }

    Ok(())
}
