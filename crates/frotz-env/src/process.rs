//! A running frotz interpreter behind the `GameProcess` seam.
//!
//! The interpreter is spawned in plain-output mode with piped stdio. There is
//! no end-of-reply marker on the wire, so reply boundaries are detected by
//! the trailing `>` prompt, falling back to a quiet window when the prompt is
//! mangled. `[MORE]` pagination is answered automatically.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::Instant;

use grunk_core::agent::GameProcess;

use crate::config_loader::FrotzConfig;

struct FrotzIo {
    stdin: ChildStdin,
    stdout: ChildStdout,
    child: Child,
}

pub struct FrotzProcess {
    io: Mutex<FrotzIo>,
    quiet: Duration,
    read_timeout: Duration,
}

impl FrotzProcess {
    pub fn spawn(config: &FrotzConfig) -> anyhow::Result<Self> {
        let mut child = Command::new(&config.binary)
            .arg("-p")
            .arg(&config.game_file)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {:?}", config.binary))?;
        let stdin = child.stdin.take().context("frotz stdin unavailable")?;
        let stdout = child.stdout.take().context("frotz stdout unavailable")?;
        tracing::info!(
            target: "frotz",
            "frotz.spawn binary={} game={}",
            config.binary,
            config.game_file.display()
        );
        Ok(Self {
            io: Mutex::new(FrotzIo {
                stdin,
                stdout,
                child,
            }),
            quiet: Duration::from_millis(config.prompt_quiet_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
        })
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        let mut io = self.io.lock().await;
        io.child.kill().await.context("failed to kill frotz")
    }

    async fn read_until_prompt(&self, io: &mut FrotzIo) -> anyhow::Result<String> {
        let mut out: Vec<u8> = Vec::new();
        let mut buf = [0u8; 4096];
        let deadline = Instant::now() + self.read_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining.min(self.quiet), io.stdout.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    if out.is_empty() {
                        anyhow::bail!("frotz closed its output");
                    }
                    break;
                }
                Ok(Ok(n)) => {
                    out.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&out);
                    let trimmed = text.trim_end();
                    if trimmed.ends_with('>') {
                        break;
                    }
                    if trimmed.ends_with("[MORE]") || trimmed.ends_with("***MORE***") {
                        io.stdin.write_all(b" ").await.context("frotz page ack failed")?;
                        io.stdin.flush().await.context("frotz page ack failed")?;
                    }
                }
                Ok(Err(e)) => return Err(e).context("frotz read failed"),
                // Quiet window elapsed: with output in hand, assume we are at
                // the prompt even if it did not render as `>`.
                Err(_) if !out.is_empty() => break,
                Err(_) => {}
            }
        }

        if out.is_empty() {
            anyhow::bail!("frotz produced no output within {:?}", self.read_timeout);
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl GameProcess for FrotzProcess {
    fn intro<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let mut io = self.io.lock().await;
            let raw = self.read_until_prompt(&mut io).await?;
            Ok(clean_reply(&raw, None))
        })
    }

    fn send<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let mut io = self.io.lock().await;
            io.stdin
                .write_all(command.as_bytes())
                .await
                .context("frotz stdin write failed")?;
            io.stdin
                .write_all(b"\n")
                .await
                .context("frotz stdin write failed")?;
            io.stdin.flush().await.context("frotz stdin flush failed")?;
            let raw = self.read_until_prompt(&mut io).await?;
            Ok(clean_reply(&raw, Some(command)))
        })
    }
}

/// Removes ANSI escape sequences. frotz in plain mode mostly avoids them,
/// but some builds still emit cursor moves for the status line.
fn strip_ansi(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            cleaned.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            // parameter bytes, then one final letter
            while let Some(&next) = chars.peek() {
                chars.next();
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        }
    }
    cleaned
}

/// Normalizes one raw reply: drops escape codes, the echoed command, prompt
/// and pagination markers, and collapses blank runs.
fn clean_reply(raw: &str, echoed: Option<&str>) -> String {
    let stripped = strip_ansi(raw);
    let mut lines: Vec<String> = Vec::new();
    for line in stripped.lines() {
        let trimmed = line.trim();
        if trimmed == ">" || trimmed == "[MORE]" || trimmed == "***MORE***" {
            continue;
        }
        if let Some(cmd) = echoed
            && (trimmed == cmd || trimmed == format!("> {cmd}") || trimmed == format!(">{cmd}"))
        {
            continue;
        }
        let without_prompt = trimmed.strip_prefix('>').map(str::trim).unwrap_or(trimmed);
        let cleaned = without_prompt.replace("[MORE]", "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(cleaned.to_string());
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
