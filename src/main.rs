mod analyzer;
mod catalog;
mod error;
mod menu;
mod parser;
mod plotter;

use std::{
    io::{self, BufWriter},
    path::PathBuf,
};

use anyhow::Result;
use catalog::{Catalog, UserKind};
use clap::Parser;
use parser::CatalogDirectory;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        help = "directory of catalog snapshot json files to load at startup"
    )]
    import: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = "./output",
        help = "where saved results, exported catalogs and plots are written"
    )]
    output: PathBuf,

    #[arg(long, help = "run the built-in demonstration and exit")]
    demo: bool,
}

fn main() -> Result<()> {
    // logs go to stderr, stdout belongs to the menu
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.demo {
        return run_demo();
    }

    let catalog = match args.import {
        Some(path) => {
            let directory = CatalogDirectory::try_from(path)?;
            tracing::info!(
                files = directory.snapshot_file_paths().len(),
                "importing catalog snapshots"
            );
            Catalog::from_snapshot(directory.parse()?)?
        }
        None => Catalog::new(),
    };

    let stdin = io::stdin();
    let mut menu = menu::Menu::new(
        catalog,
        args.output,
        stdin.lock(),
        BufWriter::new(io::stdout()),
    );
    menu.run()
}

fn run_demo() -> Result<()> {
    let mut catalog = Catalog::new();
    catalog.create_user("u1", "alice", "alice@example.com", UserKind::Creator)?;
    catalog.create_user("u2", "bob", "bob@example.com", UserKind::Viewer)?;
    catalog.create_video(
        "u1",
        "v1",
        "Demo Video",
        "http://example.com/v1",
        120,
        "Education",
    )?;
    catalog.add_comment("v1", "u2", "c1", "This is great, I love it!")?;
    catalog.add_comment("v1", "u2", "c2", "Not bad but could be better")?;
    catalog.add_comment("v1", "u2", "c3", "Terrible content, worst ever")?;

    let analyzer = analyzer::QualityAnalyzer::new("a1", "simple");
    let video = catalog.video("v1")?;
    println!("Analyzer {} ({})", analyzer.id(), analyzer.method());
    println!("{}", analyzer.generate_report(video));

    let result = analyzer.analyze(&video.comments);
    println!("\n{result}");

    Ok(())
}
