use std::io::Write;

use anyhow::{anyhow, Context};
use lsp_framing::lsp::{
    DecoderConfig, FrameEncoder, FramedStream, LspTransport, MessageFactory, SendMessage,
};
use lsp_types::Url;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};

use crate::cli::{Command, Config, DecodeConfig, EncodeConfig, EncodeSource};

pub async fn run(config: Config) -> anyhow::Result<()> {
    match config.command {
        Command::Encode(encode) => run_encode(encode).await,
        Command::Decode(decode) => run_decode(decode).await,
    }
}

async fn run_encode(config: EncodeConfig) -> anyhow::Result<()> {
    let message = build_message(config.source).await?;

    let stdout = std::io::stdout();
    let mut sink = stdout.lock();
    FrameEncoder::new()
        .write_frame(&mut sink, &message)
        .context("writing frame to stdout")?;
    info!("frame written");
    Ok(())
}

async fn build_message(source: EncodeSource) -> anyhow::Result<serde_json::Value> {
    let message = match source {
        EncodeSource::Input(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON from {}", path.display()))?
        }
        EncodeSource::Stdin => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("reading stdin")?;
            serde_json::from_str(&text).context("parsing JSON from stdin")?
        }
        EncodeSource::Build { method, id, params } => {
            let params: serde_json::Value = match params {
                Some(params) => serde_json::from_str(&params).context("parsing --params")?,
                None => serde_json::Value::Null,
            };
            let message = match id {
                Some(id) => SendMessage::Request(
                    MessageFactory::starting_at(id).create_request(&method, params)?,
                ),
                None => SendMessage::Notification(
                    MessageFactory::new().create_notification(&method, params)?,
                ),
            };
            serde_json::to_value(&message)?
        }
        EncodeSource::Initialize { workspace } => {
            let workspace = workspace.map(|uri| workspace_folder(&uri)).transpose()?;
            let request = MessageFactory::new().initialize(workspace)?;
            serde_json::to_value(&request)?
        }
    };
    Ok(message)
}

fn workspace_folder(uri: &str) -> anyhow::Result<(Url, String)> {
    let url = Url::parse(uri).with_context(|| format!("invalid workspace URI {uri}"))?;
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("workspace URI {uri} has no folder name"))?;
    Ok((url, name))
}

async fn run_decode(config: DecodeConfig) -> anyhow::Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match &config.input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let decoder_config = DecoderConfig::default().with_max_content_length(config.max_content_length);
    let mut stream = FramedStream::with_config(reader, tokio::io::sink(), decoder_config);

    let stdout = std::io::stdout();
    let mut decoded = 0usize;
    let mut skipped = 0usize;
    loop {
        match stream.recv().await {
            Ok(Some(message)) => {
                decoded += 1;
                let mut out = stdout.lock();
                writeln!(out, "{message}").context("writing to stdout")?;
            }
            Ok(None) => break,
            Err(err) if config.keep_going && err.is_recoverable() => {
                skipped += 1;
                warn!("skipping frame: {err}");
            }
            Err(err) => return Err(err).context("decoding framed input"),
        }
    }

    info!(decoded, skipped, "input exhausted");
    Ok(())
}
