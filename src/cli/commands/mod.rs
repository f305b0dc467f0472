//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod dialogue_acts;
mod helpers;
mod nonling;
mod split_edu;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use stac_util::config::{load_settings_with_options, LoadOptions};
use stac_util::corpus::{CorpusFilter, Stage};
use stac_util::models::Span;

#[derive(Parser)]
#[command(name = "stac")]
#[command(about = "Annotation and corpus-editing tools for the STAC corpus")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Which rule-based layer `nonling` adds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NonlingStage {
    /// Unit types and resources on server messages
    Units,
    /// Relations and CDUs between server messages
    Discourse,
    /// Both layers
    #[default]
    All,
}

impl NonlingStage {
    fn stages(self) -> Vec<Stage> {
        match self {
            Self::Units => vec![Stage::Units],
            Self::Discourse => vec![Stage::Discourse],
            Self::All => vec![Stage::Units, Stage::Discourse],
        }
    }
}

/// Corpus selection flags shared by the commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Document name (regex)
    #[arg(long, value_name = "REGEX")]
    doc: Option<String>,

    /// Subdocument name (regex)
    #[arg(long, value_name = "REGEX")]
    subdoc: Option<String>,

    /// Annotator name (regex)
    #[arg(long, value_name = "REGEX")]
    annotator: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self, stages: Vec<Stage>) -> anyhow::Result<CorpusFilter> {
        let filter = CorpusFilter::from_patterns(
            self.doc.as_deref(),
            self.subdoc.as_deref(),
            self.annotator.as_deref(),
            Some(stages),
        )?;
        Ok(filter)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate the game server's messages
    Nonling {
        /// Corpus directory
        corpus: PathBuf,

        /// Layer to annotate
        #[arg(long, value_enum, default_value_t = NonlingStage::All)]
        stage: NonlingStage,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict dialogue acts and addressees for player EDUs
    DialogueActs {
        /// Corpus directory
        corpus: PathBuf,

        /// Lexicon resources directory (defaults to the configured one)
        resources: Option<PathBuf>,

        /// Dialogue-act model file
        #[arg(short, long)]
        model: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split an EDU along given spans in every stage of a document
    SplitEdu {
        /// Corpus directory
        corpus: PathBuf,

        /// Document name (regex)
        #[arg(long, value_name = "REGEX")]
        doc: String,

        /// Subdocument name (regex)
        #[arg(long, value_name = "REGEX")]
        subdoc: String,

        /// Annotator name (regex)
        #[arg(long, value_name = "REGEX")]
        annotator: Option<String>,

        /// Desired output spans as START,END (must cover the original EDU)
        #[arg(long, value_name = "SPAN", num_args = 1.., required = true)]
        spans: Vec<Span>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, _config) = load_settings_with_options(options)?;

    match cli.command {
        Commands::Nonling {
            corpus,
            stage,
            filter,
            output,
        } => nonling::cmd_nonling(&settings, &corpus, stage, &filter, output),
        Commands::DialogueActs {
            corpus,
            resources,
            model,
            filter,
            output,
        } => dialogue_acts::cmd_dialogue_acts(&settings, &corpus, resources, model, &filter, output),
        Commands::SplitEdu {
            corpus,
            doc,
            subdoc,
            annotator,
            spans,
            output,
        } => {
            let filter = FilterArgs {
                doc: Some(doc),
                subdoc: Some(subdoc),
                annotator,
            };
            split_edu::cmd_split_edu(&settings, &corpus, &filter, &spans, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_edu_parses_spans() {
        let cli = Cli::try_parse_from([
            "stac", "split-edu", "corpus", "--doc", "pilot01", "--subdoc", "01", "--spans",
            "10,15", "16,20",
        ])
        .unwrap();
        match cli.command {
            Commands::SplitEdu { spans, .. } => {
                assert_eq!(spans, vec![Span::new(10, 15), Span::new(16, 20)]);
            }
            _ => panic!("expected split-edu"),
        }
    }

    #[test]
    fn test_split_edu_rejects_bad_span() {
        let parsed = Cli::try_parse_from([
            "stac", "split-edu", "corpus", "--doc", "d", "--subdoc", "s", "--spans", "10-15",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_nonling_defaults_to_all_stages() {
        let cli = Cli::try_parse_from(["stac", "nonling", "corpus"]).unwrap();
        match cli.command {
            Commands::Nonling { stage, .. } => {
                assert_eq!(stage, NonlingStage::All);
                assert_eq!(stage.stages(), vec![Stage::Units, Stage::Discourse]);
            }
            _ => panic!("expected nonling"),
        }
    }
}
