use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::info;

use rs_complete_core::automaton::{DEFAULT_OUTPUT_WIDTH, DEFAULT_TRUNCATION_MARKER};
use rs_complete_core::input::InputReader;
use rs_complete_core::{Automaton, PredictionConfig, Result};

mod report;

/// Index of the last input stage; only this one may end at end of input.
const FINAL_STAGE: usize = 2;

/// Builds a prediction automaton from training statements and completes prompts.
///
/// The input holds, separated by blank lines: the training statements, the
/// stage 1 prompts, then the compression count followed by the stage 2 prompts.
#[derive(Parser)]
#[command(name = "rs-complete")]
#[command(version)]
struct Cli {
	/// Input file (reads stdin when omitted)
	input: Option<PathBuf>,

	/// Maximum number of characters per rendered prompt line
	#[arg(short, long, default_value_t = DEFAULT_OUTPUT_WIDTH)]
	width: usize,

	/// Marker written between a prompt and its completion
	#[arg(short, long, default_value = DEFAULT_TRUNCATION_MARKER)]
	marker: String,

	/// Write a snapshot of the final automaton to this path
	#[arg(long)]
	save: Option<PathBuf>,
}

/// Answers every prompt of the current stage, one line each.
fn answer_prompts<R: BufRead, W: Write>(
	automaton: &Automaton,
	input: &mut InputReader<R>,
	out: &mut W,
	config: &PredictionConfig,
) -> Result<()> {
	while let Some(prompt) = input.next_line()? {
		let prediction = automaton.predict(&prompt, config)?;
		writeln!(out, "{}", prediction.text)?;
	}
	Ok(())
}

/// Runs the three stages over `reader` and writes the report to `out`.
///
/// - Stage 0: builds the automaton and reports its size
/// - Stage 1: completes prompts with the raw automaton
/// - Stage 2: compresses, reports, and completes prompts again
fn run<R: BufRead, W: Write>(reader: R, out: &mut W, config: &PredictionConfig, save: Option<&Path>) -> Result<()> {
	let mut input = InputReader::new(reader, FINAL_STAGE);

	let mut automaton = Automaton::new();
	automaton.read_stage(&mut input)?;
	report::stage_zero(out, &automaton)?;

	report::stage_header(out, 1)?;
	answer_prompts(&automaton, &mut input, out, config)?;

	let count = input.read_count()?;
	let outcome = automaton.compress(count);
	info!("Compression: {outcome:?}");
	report::stage_two(out, &automaton)?;
	answer_prompts(&automaton, &mut input, out, config)?;
	report::the_end(out)?;

	if let Some(path) = save {
		automaton.save(path)?;
		info!("Saved automaton to {}", path.display());
	}
	Ok(())
}

fn main() -> std::result::Result<ExitCode, Box<dyn std::error::Error>> {
	env_logger::init();
	let cli = Cli::parse();
	let config = PredictionConfig::new(cli.width, cli.marker.as_str())?;

	let stdout = io::stdout();
	let mut out = stdout.lock();
	let result = match &cli.input {
		Some(path) => run(BufReader::new(File::open(path)?), &mut out, &config, cli.save.as_deref()),
		None => run(io::stdin().lock(), &mut out, &config, cli.save.as_deref()),
	};

	match result {
		Ok(()) => Ok(ExitCode::SUCCESS),
		Err(e) if e.is_malformed_input() => {
			log::error!("{e}");
			writeln!(out, "Invalid test file, program terminated")?;
			Ok(ExitCode::FAILURE)
		}
		Err(e) => Err(e.into()),
	}
}
