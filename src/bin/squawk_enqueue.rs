//! squawk-enqueue - 向运行中的 squawk 注入一条标题
//!
//! 连接本地 Unix socket，写入标题后关闭写端。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

/// Inject a headline into a running squawk instance
#[derive(Parser)]
#[command(name = "squawk-enqueue")]
#[command(version)]
#[command(about = "Inject a headline into a running squawk instance", long_about = None)]
struct Cli {
    /// Injector socket path
    #[arg(short, long, env = "SQUAWK_INJECTOR__SOCKET_PATH", default_value = "/tmp/squawk.sock")]
    socket: PathBuf,

    /// Headline words, joined with single spaces
    #[arg(trailing_var_arg = true)]
    title: Vec<String>,
}

impl Cli {
    fn title(&self) -> String {
        let title = self.title.join(" ");
        if title.trim().is_empty() {
            "Test headline from helper".to_string()
        } else {
            title
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let title = cli.title();

    let mut stream = UnixStream::connect(&cli.socket)
        .await
        .with_context(|| format!("Could not connect to {}", cli.socket.display()))?;
    stream.write_all(title.as_bytes()).await?;
    stream.shutdown().await?;

    println!("Enqueued: {}", title);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_joined() {
        let cli = Cli::parse_from(["squawk-enqueue", "-s", "/tmp/x.sock", "Fed", "cuts", "rates"]);
        assert_eq!(cli.socket, PathBuf::from("/tmp/x.sock"));
        assert_eq!(cli.title(), "Fed cuts rates");
    }

    #[test]
    fn test_default_title() {
        let cli = Cli::parse_from(["squawk-enqueue"]);
        assert_eq!(cli.title(), "Test headline from helper");
    }
}
