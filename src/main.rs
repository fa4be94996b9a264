use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "opalc", version, about = "The Opal compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an .opal source file to JavaScript
    Compile {
        /// Source file path
        file: PathBuf,
        /// Output path
        #[arg(short, long, default_value = "out.js")]
        output: PathBuf,
    },
    /// Parse and validate a source file without emitting code
    Check {
        /// Source file path
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, output } => {
            let source = read_source(&file);
            match opal::compile(&source) {
                Ok(emitted) => {
                    if let Err(e) = std::fs::write(&output, emitted) {
                        eprintln!("error: failed to write {}: {e}", output.display());
                        std::process::exit(1);
                    }
                }
                Err(err) => {
                    opal::diagnostics::render_error(&source, &file.to_string_lossy(), &err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let source = read_source(&file);
            if let Err(err) = opal::check(&source) {
                opal::diagnostics::render_error(&source, &file.to_string_lossy(), &err);
                std::process::exit(1);
            }
        }
    }
}

fn read_source(file: &PathBuf) -> String {
    match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", file.display());
            std::process::exit(1);
        }
    }
}
