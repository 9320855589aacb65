//! CLI tool for extracting the text of a PowerPoint file to a text file.

use anyhow::{Context, Result};
use clap::Parser;
use slidetext_core::extract::rule;
use slidetext_core::Error;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_INPUT: &str = "Eureka Concept_v1_2.pptx";
const DEFAULT_OUTPUT: &str = "project_description.txt";

/// Extract the text of every slide in a presentation into a text file.
#[derive(Parser, Debug)]
#[command(name = "extract-pptx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output text file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let stdout = std::io::stdout();
    let status = execute(&args, &mut stdout.lock());
    ExitCode::from(status)
}

/// Run one extraction and return the process exit status.
///
/// Status and error messages go to `console`; the error chain goes to stderr.
fn execute(args: &Args, console: &mut impl Write) -> u8 {
    if !args.input.exists() {
        let _ = writeln!(console, "Error: {}", Error::MissingInputFile(args.input.clone()));
        return 1;
    }

    match run(args, console) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(console, "Error extracting text: {}", e);
            eprintln!("{:?}", e);
            1
        }
    }
}

fn run(args: &Args, console: &mut impl Write) -> Result<()> {
    let text = slidetext_pptx::extract(&args.input)
        .with_context(|| format!("Failed to extract text from {}", args.input.display()))?;

    log::debug!(
        "Extracted {} lines from {} slides",
        text.lines().len(),
        text.slide_count()
    );

    let content = text.to_string();
    write_output(&args.output, &content)?;

    // A run that fails after the file was written leaves no output behind.
    if let Err(e) = print_report(console, &args.output, &content) {
        discard_output(&args.output);
        return Err(e).with_context(|| "Failed to write to console");
    }

    Ok(())
}

/// Write output to a file, removing it again if the write fails.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    if let Err(e) = file.write_all(content.as_bytes()).and_then(|()| file.flush()) {
        drop(file);
        discard_output(path);
        return Err(e).with_context(|| format!("Failed to write to {}", path.display()));
    }

    Ok(())
}

/// Remove an output file this run created.
fn discard_output(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::warn!("Could not remove partial {}: {}", path.display(), e);
    }
}

/// Echo the result the way the run is reported on the console.
fn print_report(console: &mut impl Write, output_path: &Path, content: &str) -> std::io::Result<()> {
    let rule = rule();
    writeln!(console, "Text extracted successfully to {}", output_path.display())?;
    writeln!(console, "\n{}", rule)?;
    writeln!(console, "EXTRACTED CONTENT:")?;
    writeln!(console, "{}\n", rule)?;
    writeln!(console, "{}", content)?;
    console.flush()
}
