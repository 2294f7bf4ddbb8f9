//! Subcommands that run without the chat screen

use crate::config::Config;
use crate::dispatcher::{Dispatcher, SubmitOutcome};
use crate::markdown;
use crate::transport::HttpTransport;
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Send one message and write the reply as plain text.
///
/// A failed request still succeeds here: the fallback reply is what gets printed.
pub async fn ask(config: &Config, text: &str, out: &mut impl Write) -> Result<()> {
    let transport = HttpTransport::new(config)?;
    let mut dispatcher = Dispatcher::new(Arc::new(transport));

    if let SubmitOutcome::Rejected(reason) = dispatcher.send(text).await {
        bail!("Nothing to send: {reason:?}");
    }

    let reply = dispatcher
        .conversation()
        .last()
        .context("Conversation has no reply")?;

    for line in markdown::render(&reply.text, config.ui.accent.color()) {
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        writeln!(out, "{text}")?;
    }
    Ok(())
}

/// Print the effective configuration, writing the default file first when `init` is set
pub fn show_config(config: &Config, path: &Path, init: bool, out: &mut impl Write) -> Result<()> {
    if init {
        if path.exists() {
            writeln!(out, "Config already exists at {}", path.display())?;
        } else {
            Config::default().save_to(path)?;
            writeln!(out, "Wrote default config to {}", path.display())?;
        }
    }
    write!(out, "{}", config.to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut out = Vec::new();

        show_config(&Config::default(), &path, true, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Wrote default config"));
        assert!(printed.contains("http://localhost:8000/chat"));
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn init_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = \"http://example.test/chat\"\n").unwrap();
        let mut out = Vec::new();

        show_config(&Config::default(), &path, true, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Config already exists"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "endpoint = \"http://example.test/chat\"\n"
        );
    }

    #[test]
    fn without_init_nothing_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut out = Vec::new();

        show_config(&Config::default(), &path, false, &mut out).unwrap();

        assert!(!path.exists());
        assert!(String::from_utf8(out).unwrap().contains("request_field"));
    }

    #[tokio::test]
    async fn blank_question_is_an_error() {
        let mut out = Vec::new();
        let result = ask(&Config::default(), "   ", &mut out).await;
        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
