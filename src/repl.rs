//! Interactive session: plain lines are prompts, `:` lines are commands.

use crate::app::{App, SubmitOutcome};
use crate::confirm::PromptConfirmation;
use crate::gallery::{render_aspect_ratios, render_history};
use crate::models::AspectRatio;
use crate::Result;
use std::io::{BufRead, Write};
use std::path::Path;

pub const HELP: &str = "\
Type a prompt and press enter to generate an image.

Commands:
  :ratio [R]            show the aspect ratios, or select one (1:1, 3:4, 4:3, 9:16, 16:9)
  :retry                resubmit the prompt from the last failed attempt
  :list                 show the history, newest first
  :delete ID            delete an image (full id or unique prefix)
  :download ID [DIR]    save an image as PNG
  :clear                delete the whole history (asks first)
  :help                 show this help
  :quit                 exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Prompt(&'a str),
    Ratio(Option<&'a str>),
    Retry,
    List,
    Delete(&'a str),
    Download(&'a str, Option<&'a str>),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Command::Prompt(line);
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match (name, args.as_slice()) {
        ("ratio" | "r", []) => Command::Ratio(None),
        ("ratio" | "r", &[ratio]) => Command::Ratio(Some(ratio)),
        ("retry", []) => Command::Retry,
        ("list" | "ls", []) => Command::List,
        ("delete" | "rm", &[id]) => Command::Delete(id),
        ("download" | "dl", &[id]) => Command::Download(id, None),
        ("download" | "dl", &[id, dir]) => Command::Download(id, Some(dir)),
        ("clear", []) => Command::Clear,
        ("help" | "h" | "?", []) => Command::Help,
        ("quit" | "q" | "exit", []) => Command::Quit,
        _ => Command::Invalid(format!(
            "Unrecognized command ':{}'. Type :help for the list of commands.",
            command
        )),
    }
}

/// Human-readable line for a submission result.
pub fn describe_outcome(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Ignored => "Nothing to generate: enter a prompt first.".to_string(),
        SubmitOutcome::Generated(image) => format!(
            "Generated {} ({}, {}) for \"{}\"",
            image.id,
            image.aspect_ratio.label(),
            image.aspect_ratio,
            image.prompt
        ),
        SubmitOutcome::Failed(message) => format!("Error: {}", message),
    }
}

fn prompt_marker(app: &App) -> String {
    format!("lumina [{}]> ", app.session().settings().aspect_ratio)
}

/// Run the read-eval-print loop until `:quit` or end of input.
pub async fn run<R: BufRead, W: Write>(
    app: &mut App,
    input: &mut R,
    output: &mut W,
    default_download_dir: &Path,
) -> Result<()> {
    writeln!(output, "{}", HELP)?;

    loop {
        write!(output, "{}", prompt_marker(app))?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        match parse_line(&line) {
            Command::Empty => {}
            Command::Prompt(prompt) => {
                writeln!(output, "Generating...")?;
                match app.generate(prompt).await {
                    Ok(outcome) => writeln!(output, "{}", describe_outcome(&outcome))?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                }
            }
            Command::Retry => {
                if app.session().error().is_none() {
                    writeln!(output, "Nothing to retry.")?;
                    continue;
                }
                writeln!(output, "Retrying \"{}\"...", app.session().prompt())?;
                match app.submit().await {
                    Ok(outcome) => writeln!(output, "{}", describe_outcome(&outcome))?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                }
            }
            Command::Ratio(None) => {
                writeln!(output, "{}", render_aspect_ratios(app.session().settings()))?
            }
            Command::Ratio(Some(value)) => match value.parse::<AspectRatio>() {
                Ok(ratio) => {
                    app.session_mut().select_aspect_ratio(ratio);
                    writeln!(output, "Aspect ratio set to {} ({})", ratio, ratio.label())?;
                }
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::List => writeln!(output, "{}", render_history(app.history()))?,
            Command::Delete(id) => match app.delete(id).await {
                Ok(Some(image)) => writeln!(output, "Deleted {}", image.id)?,
                Ok(None) => writeln!(output, "No image matches '{}'", id)?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::Download(id, dir) => {
                let dir = dir.map(Path::new).unwrap_or(default_download_dir);
                match app.download(id, dir).await {
                    Ok(path) => writeln!(output, "Saved {}", path.display())?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                }
            }
            Command::Clear => {
                if app.history().is_empty() {
                    writeln!(output, "History is already empty.")?;
                    continue;
                }
                let cleared = {
                    let gate = PromptConfirmation::new(&mut *input, &mut *output);
                    app.clear_history(&gate).await
                };
                match cleared {
                    Ok(true) => writeln!(output, "History cleared.")?,
                    Ok(false) => writeln!(output, "Cancelled.")?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                }
            }
            Command::Help => writeln!(output, "{}", HELP)?,
            Command::Quit => break,
            Command::Invalid(message) => writeln!(output, "{}", message)?,
        }
    }

    Ok(())
}
