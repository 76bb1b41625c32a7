use std::io::{self, Write};

use rs_complete_core::Automaton;

/// Stage header, `==STAGE n====...`.
pub fn stage_header<W: Write>(out: &mut W, stage: usize) -> io::Result<()> {
	writeln!(out, "==STAGE {stage}============================")
}

/// Stage 0: input statistics of the freshly built automaton.
pub fn stage_zero<W: Write>(out: &mut W, automaton: &Automaton) -> io::Result<()> {
	stage_header(out, 0)?;
	writeln!(out, "Number of statements: {}", automaton.statement_count())?;
	writeln!(out, "Number of characters: {}", automaton.character_count())?;
	writeln!(out, "Number of states: {}", automaton.state_count())
}

/// Stage 2: size of the compressed automaton, then a separator.
pub fn stage_two<W: Write>(out: &mut W, automaton: &Automaton) -> io::Result<()> {
	stage_header(out, 2)?;
	writeln!(out, "Number of states: {}", automaton.state_count())?;
	writeln!(out, "Total frequency: {}", automaton.total_frequency())?;
	writeln!(out, "-------------------------------------")
}

pub fn the_end<W: Write>(out: &mut W) -> io::Result<()> {
	writeln!(out, "==THE END============================")
}
