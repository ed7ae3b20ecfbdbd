use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for shadowlock")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, then the full test suite
    Check,
    /// cargo fmt --check
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// Run all tests
    Test {
        /// Skip the desktop app (no windowing libraries needed)
        #[arg(long)]
        headless: bool,
    },
    /// Build rustdoc for the workspace
    Doc,
    /// Parse the puzzle meshes with the CLI and print their stats
    Assets {
        #[arg(long, default_value = "assets")]
        dir: PathBuf,
    },
}

const MESH_FILES: [&str; 2] = ["dodec.json", "temple.json"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test(false)?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test { headless } => test(headless)?,
        Commands::Doc => cargo("cargo doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Assets { dir } => {
            for file in MESH_FILES {
                let path = dir.join(file);
                let path = path.to_string_lossy();
                cargo(
                    &format!("mesh {path}"),
                    &["run", "-q", "-p", "shadowlock-cli", "--", "mesh", &path],
                )?;
            }
        }
    }

    Ok(())
}

fn fmt() -> Result<()> {
    cargo("cargo fmt --check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "cargo clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test(headless: bool) -> Result<()> {
    let mut args = vec!["test", "--workspace"];
    if headless {
        args.extend(["--exclude", "shadowlock-desktop"]);
    }
    cargo("cargo test", &args)
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed");
    }
    Ok(())
}
