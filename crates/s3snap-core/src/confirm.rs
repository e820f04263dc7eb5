//! Operator confirmation before destructive or costly steps.

use std::io::{self, BufRead, Write};

/// Asks the operator a yes/no question.
///
/// Only a case-insensitive `y` counts as yes.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Used when `--verify` is off: announces the step and proceeds.
#[derive(Debug, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        println!("{question}");
        Ok(true)
    }
}

/// Interactive prompt reading one line per question.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Confirm for ConsolePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question} Continue? [y/n]: ")?;
        self.output.flush()?;
        let mut line = String::new();
        // EOF reads as an empty answer, which declines.
        self.input.read_line(&mut line)?;
        Ok(is_yes(&line))
    }
}

/// `true` only for `y` or `Y`, ignoring the line terminator.
pub fn is_yes(answer: &str) -> bool {
    answer
        .trim_end_matches(['\r', '\n'])
        .eq_ignore_ascii_case("y")
}
