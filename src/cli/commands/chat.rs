//! Interactive chat command.

use super::{prepare, quiz::take_quiz};
use crate::cli::{Output, SourceArgs, StreamingText};
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Process material, show the summary and chat about it.
pub async fn run_chat(source: SourceArgs, settings: Settings) -> Result<()> {
    let (pipeline, mut session, _report) = prepare(source, settings).await?;

    Output::header("Summary");
    println!("\n{}\n", session.summary().unwrap_or_default());

    println!("{}", style("Study Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the material, or use /quiz, /summary, /clear. Type 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        match input {
            "/clear" => {
                session.clear_transcript();
                Output::info("Conversation history cleared.");
                continue;
            }
            "/summary" => {
                Output::header("Summary");
                println!("\n{}\n", session.summary().unwrap_or_default());
                continue;
            }
            "/quiz" => {
                take_quiz(&pipeline, &mut session).await?;
                continue;
            }
            _ => {}
        }

        println!("\n{}", style("Assistant:").cyan().bold());
        let mut display = StreamingText::new();
        let reply = pipeline
            .ask(&mut session, input, |partial| display.update(partial))
            .await?;
        display.finish(&reply);
        println!();
    }

    Ok(())
}
