use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for depthview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the rasterizer benchmarks
    Bench,
    /// Render a headless smoke frame with the CLI and export it
    Smoke {
        /// Directory for the snapshot and point cloud
        #[arg(long, default_value = "target/smoke")]
        out_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_doc()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Bench => run_bench()?,
        Commands::Smoke { out_dir } => run_smoke(&out_dir)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {step}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {step} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("fmt --check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn run_tests() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn run_doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn run_build() -> Result<()> {
    cargo("build", &["build", "--workspace"])
}

fn run_bench() -> Result<()> {
    cargo(
        "bench",
        &["bench", "-p", "depthview-render", "--bench", "bench_rasterize"],
    )
}

fn run_smoke(out_dir: &str) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    let snapshot = format!("{out_dir}/smoke.png");
    let export = format!("{out_dir}/smoke.ply");
    cargo(
        "run (headless smoke render)",
        &[
            "run", "-p", "depthview-cli", "--", "render", "--device", "synthetic-rgbd", "--frames",
            "5", "--color", "--yaw", "20", "--fps", "0", "--snapshot", &snapshot, "--export",
            &export,
        ],
    )?;
    println!("Smoke output in {out_dir}");
    Ok(())
}
