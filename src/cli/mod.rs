//! CLI module for Syllabus.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Syllabus - a course materials assistant
///
/// Indexes course documents and answers questions about them with a
/// tool-using language model.
#[derive(Parser, Debug)]
#[command(name = "syllabus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Folder of course documents to index on startup
        #[arg(long)]
        docs: Option<String>,

        /// Folder with a static frontend served at /
        #[arg(long)]
        static_dir: Option<String>,
    },

    /// Ask a single question about the course materials
    Ask {
        /// The question to ask
        question: String,

        /// Model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive chat session
    Chat {
        /// Model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Index a folder of course documents
    Index {
        /// Folder containing .txt or .md course documents
        path: String,

        /// Remove all indexed courses first
        #[arg(long)]
        clear: bool,
    },

    /// List indexed courses
    Courses,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["syllabus", "-vv", "serve", "--port", "9000", "--docs", "docs"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port, docs, static_dir } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(docs.as_deref(), Some("docs"));
                assert_eq!(static_dir, None);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_index_with_clear() {
        let cli = Cli::parse_from(["syllabus", "index", "courses/", "--clear"]);
        assert!(matches!(cli.command, Commands::Index { clear: true, .. }));
    }
}
