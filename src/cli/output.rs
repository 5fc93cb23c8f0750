//! CLI output formatting utilities.

use crate::quiz::GradeReport;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a lettered answer option.
    pub fn option(letter: char, text: &str) {
        println!("    {} {}", style(format!("{letter})")).cyan(), text);
    }

    /// Print graded quiz results.
    pub fn grade_report(report: &GradeReport, pass_score: f64) {
        Self::header("Results");
        for (i, result) in report.results.iter().enumerate() {
            let mark = if result.is_correct {
                style("correct").green()
            } else {
                style("wrong").red()
            };
            println!("\n  {}. {} [{}]", i + 1, style(&result.question).bold(), mark);
            Self::kv(
                "Your answer",
                result.selected.as_deref().unwrap_or("(no answer)"),
            );
            if !result.is_correct {
                Self::kv("Correct answer", &result.correct_answer);
            }
        }

        println!(
            "\n  Score: {} ({}/{})",
            style(format!("{}%", report.score_display())).bold(),
            report.correct,
            report.total
        );
        if report.passed(pass_score) {
            Self::success(report.verdict(pass_score));
        } else {
            Self::warning(report.verdict(pass_score));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Redraws a streamed answer in place, with a cursor while incomplete.
pub struct StreamingText {
    term: Term,
    lines: usize,
}

impl Default for StreamingText {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingText {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            lines: 0,
        }
    }

    /// Show the partial answer.
    pub fn update(&mut self, partial: &str) {
        self.redraw(&crate::rag::render_partial(partial));
    }

    /// Replace the partial answer with the final text.
    pub fn finish(&mut self, text: &str) {
        self.redraw(text);
        self.lines = 0;
    }

    fn redraw(&mut self, text: &str) {
        if self.lines > 0 {
            let _ = self.term.clear_last_lines(self.lines);
        }
        let _ = self.term.write_line(text);
        self.lines = rendered_lines(text, self.term.size().1 as usize);
    }
}

/// Number of terminal rows `text` occupies at the given width.
fn rendered_lines(text: &str, width: usize) -> usize {
    let width = width.max(1);
    text.split('\n')
        .map(|line| console::measure_text_width(line).max(1).div_ceil(width))
        .sum()
}
