//! Terminal interaction that turns a quiz into an [`AnswerMap`].

use std::io::{self, BufRead, Write};

use super::grading::AnswerMap;
use crate::agents::types::Quiz;

/// Collects the user's answers for a quiz.
pub trait AnswerCollector {
    /// Answers keyed by question number. Questions left out are unanswered.
    fn collect(&mut self, quiz: &Quiz) -> io::Result<AnswerMap>;
}

/// Numbered-choice quiz over a line reader and a writer.
///
/// Options are shown numbered from 1 and the user types the number. Invalid
/// input re-prompts. End of input stops collection; the remaining questions
/// stay unanswered.
pub struct TerminalQuiz<R, W> {
    input: R,
    output: W,
}

impl TerminalQuiz<io::StdinLock<'static>, io::Stdout> {
    /// Quiz on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalQuiz<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Read one choice in `1..=count`. `None` on end of input.
    fn read_choice(&mut self, count: usize) -> io::Result<Option<usize>> {
        let mut line = String::new();
        loop {
            write!(
                self.output,
                "Enter the number of your choice (1-{}): ",
                count
            )?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(None);
            }

            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=count).contains(&choice) => return Ok(Some(choice)),
                _ => writeln!(
                    self.output,
                    "Invalid input. Please enter a number between 1 and {}.",
                    count
                )?,
            }
        }
    }
}

impl<R: BufRead, W: Write> AnswerCollector for TerminalQuiz<R, W> {
    fn collect(&mut self, quiz: &Quiz) -> io::Result<AnswerMap> {
        let mut answers = AnswerMap::new();

        writeln!(self.output, "\n===============================================")?;
        writeln!(self.output, "       STARTING INTERACTIVE QUIZ: {}", quiz.title)?;
        writeln!(self.output, "===============================================")?;

        for question in &quiz.questions {
            writeln!(self.output, "\n--- Question {} ---", question.question_number)?;
            writeln!(self.output, "{}", question.question_text)?;
            for (idx, option) in question.options.iter().enumerate() {
                writeln!(self.output, "  {}. {}", idx + 1, option)?;
            }

            match self.read_choice(question.options.len())? {
                Some(choice) => {
                    answers.insert(
                        question.question_number,
                        question.options[choice - 1].clone(),
                    );
                }
                None => {
                    tracing::warn!(
                        answered = answers.len(),
                        total = quiz.len(),
                        "Input closed before the quiz finished"
                    );
                    break;
                }
            }
        }

        Ok(answers)
    }
}
