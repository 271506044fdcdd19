use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lsp_framing::lsp::decoder::DEFAULT_MAX_CONTENT_LENGTH;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Encode(EncodeConfig),
    Decode(DecodeConfig),
}

/// What to frame. Without a method or input file the default `initialize`
/// request is produced.
#[derive(Debug, Clone)]
pub enum EncodeSource {
    Input(PathBuf),
    Stdin,
    Build {
        method: String,
        id: Option<i64>,
        params: Option<String>,
    },
    Initialize {
        workspace: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct EncodeConfig {
    pub source: EncodeSource,
}

#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// `None` reads stdin.
    pub input: Option<PathBuf>,
    pub max_content_length: usize,
    pub keep_going: bool,
}

#[derive(Parser, Debug)]
#[command(name = "lsp-framing")]
#[command(about = "Encode and decode LSP Content-Length framed JSON-RPC", long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Frame one JSON message and write it to stdout
    Encode {
        /// JSON file to frame ("-" for stdin)
        #[arg(short, long, conflicts_with = "method")]
        input: Option<PathBuf>,
        /// Build a message with this method instead of reading one
        #[arg(short, long)]
        method: Option<String>,
        /// Request id; without it the built message is a notification
        #[arg(long, requires = "method")]
        id: Option<i64>,
        /// Params as a JSON string
        #[arg(short, long, requires = "method")]
        params: Option<String>,
        /// Workspace folder URI for the default initialize request
        #[arg(short, long, conflicts_with_all = ["input", "method"])]
        workspace: Option<String>,
    },
    /// Read framed messages and print one JSON document per line
    Decode {
        /// Framed input file ("-" or omitted for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_MAX_CONTENT_LENGTH)]
        max_content_length: usize,
        /// Log and skip malformed frames instead of failing
        #[arg(short, long)]
        keep_going: bool,
    },
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn into_config(self) -> Config {
        let command = match self.command {
            CliCommand::Encode {
                input,
                method,
                id,
                params,
                workspace,
            } => {
                let source = match (input, method) {
                    (Some(path), _) if is_stdin(&path) => EncodeSource::Stdin,
                    (Some(path), _) => EncodeSource::Input(path),
                    (None, Some(method)) => EncodeSource::Build { method, id, params },
                    (None, None) => EncodeSource::Initialize { workspace },
                };
                Command::Encode(EncodeConfig { source })
            }
            CliCommand::Decode {
                input,
                max_content_length,
                keep_going,
            } => Command::Decode(DecodeConfig {
                input: input.filter(|path| !is_stdin(path)),
                max_content_length,
                keep_going,
            }),
        };

        Config {
            log_level: self.log_level,
            command,
        }
    }
}

fn is_stdin(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}
