//! Quiz command implementation.

use super::prepare;
use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::quiz::Quiz;
use crate::session::StudySession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

const LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];

/// Process material and take a quiz on it.
pub async fn run_quiz(source: SourceArgs, settings: Settings) -> Result<()> {
    let (pipeline, mut session, _report) = prepare(source, settings).await?;
    take_quiz(&pipeline, &mut session).await
}

/// Generate a quiz, ask every question on the terminal and print the grade.
pub(super) async fn take_quiz(pipeline: &Pipeline, session: &mut StudySession) -> Result<()> {
    let spinner = Output::spinner("Generating quiz...");
    let result = pipeline.generate_quiz(session).await;
    spinner.finish_and_clear();

    let quiz = match result {
        Ok(quiz) => quiz,
        Err(e) => {
            Output::error(&format!("Could not generate a quiz: {}", e));
            return Ok(());
        }
    };

    let answers = ask_questions(&quiz)?;
    let report = pipeline.submit_quiz(session, &answers)?;
    Output::grade_report(&report, pipeline.settings().quiz.pass_score);

    Ok(())
}

fn ask_questions(quiz: &Quiz) -> Result<Vec<Option<String>>> {
    Output::header(&format!("Quiz ({} questions)", quiz.len()));
    println!("{}", style("Answer with a letter; press Enter to skip.").dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut answers = Vec::with_capacity(quiz.len());

    for (i, item) in quiz.items.iter().enumerate() {
        println!("\n  {}. {}", i + 1, style(&item.question).bold());
        for (letter, option) in LETTERS.iter().zip(&item.options) {
            Output::option(*letter, option);
        }

        print!("{} ", style("Answer:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        stdin.lock().read_line(&mut input)?;
        answers.push(selected_option(input.trim(), &item.options));
    }

    Ok(answers)
}

/// Map a typed letter to the option text.
fn selected_option(input: &str, options: &[String]) -> Option<String> {
    let mut chars = input.chars();
    let letter = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }
    let position = LETTERS.iter().position(|l| *l == letter)?;
    options.get(position).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_option() {
        let options: Vec<String> = ["Rome", "Paris", "Oslo", "Bern"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(selected_option("b", &options), Some("Paris".to_string()));
        assert_eq!(selected_option("D", &options), Some("Bern".to_string()));
        assert_eq!(selected_option("", &options), None);
        assert_eq!(selected_option("e", &options), None);
        assert_eq!(selected_option("ab", &options), None);
    }
}
