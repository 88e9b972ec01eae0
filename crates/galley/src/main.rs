use std::{fs::File, io::Write, path::PathBuf};

use clap::Parser;
use galley::config::Config;

/// declarative recipes over quantum-chemistry engines
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// job file
    #[arg(value_parser, default_value_t = String::from("galley.toml"))]
    infile: String,

    /// write the result record here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Set the maximum number of threads to use. Defaults to 0, which means
    /// to use as many threads as there are CPUs.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    descent::max_threads(args.threads);
    let config = Config::load(&args.infile);
    log::info!("dispatching {:?}", config.recipe);
    let record = config.run()?;
    let pretty = serde_json::to_string_pretty(&record)?;
    match &args.output {
        Some(path) => {
            let mut f = File::create(path)?;
            writeln!(f, "{pretty}")?;
        }
        None => println!("{pretty}"),
    }
    log::info!("normal termination of galley");
    Ok(())
}
