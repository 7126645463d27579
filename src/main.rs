use anyhow::Result;
use clap::{Parser, Subcommand};
use lumina::app::{App, SubmitOutcome};
use lumina::confirm::{ConfirmationGate, Preapproved, PromptConfirmation};
use lumina::gallery::{render_aspect_ratios, render_history};
use lumina::models::{AspectRatio, Config, GenerationSettings};
use lumina::repl::{self, describe_outcome};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "lumina")]
#[command(about = "Generate images from text prompts and browse your history")]
#[command(version)]
struct CliArgs {
    /// History file to use instead of LUMINA_HISTORY_PATH / the default location.
    #[arg(long, global = true, value_name = "PATH")]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one image from a prompt and add it to the history.
    Generate {
        /// The prompt text.
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Aspect ratio: 1:1, 3:4, 4:3, 9:16 or 16:9 (labels like "wide" work too).
        #[arg(short, long, default_value = "1:1")]
        aspect_ratio: AspectRatio,

        /// Also save the image as PNG into this directory.
        #[arg(long, value_name = "DIR")]
        download: Option<PathBuf>,
    },
    /// Show the history, newest first.
    List,
    /// Delete one image from the history.
    Delete {
        /// Full id or unique id prefix.
        id: String,
    },
    /// Save one image from the history as PNG.
    Download {
        /// Full id or unique id prefix.
        id: String,

        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
    /// Delete the whole history.
    Clear {
        /// Skip the confirmation question.
        #[arg(short, long)]
        yes: bool,
    },
    /// List the supported aspect ratios.
    Ratios,
    /// Interactive prompt loop (the default).
    Interactive {
        /// Directory for :download when none is given.
        #[arg(long, value_name = "DIR", default_value = ".")]
        download_dir: PathBuf,
    },
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(path) = args.history {
        config.history_path = path;
    }

    let command = args.command.unwrap_or(Command::Interactive {
        download_dir: PathBuf::from("."),
    });

    let mut app = match command {
        Command::Ratios => {
            println!("{}", render_aspect_ratios(GenerationSettings::default()));
            return Ok(());
        }
        _ => App::new(&config).await,
    };

    match command {
        Command::Generate {
            prompt,
            aspect_ratio,
            download,
        } => {
            app.session_mut().select_aspect_ratio(aspect_ratio);
            let outcome = app.generate(&prompt.join(" ")).await?;

            match outcome {
                SubmitOutcome::Generated(ref image) => {
                    println!("{}", describe_outcome(&outcome));
                    if let Some(dir) = download {
                        let path = app.download(&image.id.to_string(), &dir).await?;
                        println!("Saved {}", path.display());
                    }
                }
                SubmitOutcome::Ignored => anyhow::bail!("Prompt must not be empty"),
                SubmitOutcome::Failed(message) => anyhow::bail!(message),
            }
        }
        Command::List => println!("{}", render_history(app.history())),
        Command::Delete { id } => match app.delete(&id).await? {
            Some(image) => println!("Deleted {}", image.id),
            None => anyhow::bail!("No image matches '{}'", id),
        },
        Command::Download { id, output } => {
            let path = app.download(&id, &output).await?;
            println!("Saved {}", path.display());
        }
        Command::Clear { yes } => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut stdout = std::io::stdout();
            let cleared = {
                let gate: Box<dyn ConfirmationGate + '_> = if yes {
                    Box::new(Preapproved(true))
                } else {
                    Box::new(PromptConfirmation::new(&mut input, &mut stdout))
                };
                app.clear_history(gate.as_ref()).await?
            };
            if cleared {
                println!("History cleared.");
            } else if app.history().is_empty() {
                println!("History is already empty.");
            } else {
                println!("Cancelled.");
            }
        }
        Command::Interactive { download_dir } => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut stdout = std::io::stdout();
            repl::run(&mut app, &mut input, &mut stdout, &download_dir).await?;
        }
        Command::Ratios => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumina=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!("Starting lumina");

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args_parse() {
        let args = CliArgs::try_parse_from([
            "lumina",
            "generate",
            "a",
            "red",
            "fox",
            "--aspect-ratio",
            "wide",
        ])
        .unwrap();

        match args.command {
            Some(Command::Generate {
                prompt,
                aspect_ratio,
                download,
            }) => {
                assert_eq!(prompt.join(" "), "a red fox");
                assert_eq!(aspect_ratio, AspectRatio::Wide);
                assert!(download.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_aspect_ratio_is_rejected() {
        let err = CliArgs::try_parse_from(["lumina", "generate", "fox", "-a", "2:1"]).unwrap_err();
        assert!(err.to_string().contains("16:9"));
    }

    #[test]
    fn test_no_subcommand_defaults_to_interactive() {
        let args = CliArgs::try_parse_from(["lumina", "--history", "/tmp/h.json"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.history, Some(PathBuf::from("/tmp/h.json")));
    }
}
