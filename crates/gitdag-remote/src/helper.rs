//! The git remote-helper command loop.
//!
//! Git writes one command per line. `push` commands arrive in batches
//! terminated by a blank line; every push in the batch is answered with
//! `ok <dst>` or `error <dst> <why>`, followed by a blank line. A blank line
//! outside a batch, or end of input, ends the session. Input that ends
//! inside a batch is an error and none of its pushes run.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::handler::ProtocolHandler;

/// One parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Capabilities,
    List { for_push: bool },
    /// `push [+]<src>:<dst>`. An empty `src` deletes `dst`.
    Push { force: bool, src: String, dst: String },
    /// `option <name> <value>`; none are supported.
    Option { name: String },
    /// Ends a push batch or the session.
    Blank,
}

impl Command {
    pub fn parse(line: &str) -> RemoteResult<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(Self::Blank);
        }
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        match (verb, rest) {
            ("capabilities", "") => Ok(Self::Capabilities),
            ("list", "") => Ok(Self::List { for_push: false }),
            ("list", "for-push") => Ok(Self::List { for_push: true }),
            ("push", spec) => {
                let (force, spec) = match spec.strip_prefix('+') {
                    Some(spec) => (true, spec),
                    None => (false, spec),
                };
                let (src, dst) = spec
                    .split_once(':')
                    .ok_or_else(|| RemoteError::UnknownCommand(line.to_string()))?;
                if dst.is_empty() {
                    return Err(RemoteError::UnknownCommand(line.to_string()));
                }
                Ok(Self::Push {
                    force,
                    src: src.to_string(),
                    dst: dst.to_string(),
                })
            }
            ("option", opt) if !opt.is_empty() => Ok(Self::Option {
                name: opt.split(' ').next().unwrap_or(opt).to_string(),
            }),
            _ => Err(RemoteError::UnknownCommand(line.to_string())),
        }
    }
}

/// Run a remote-helper session until a blank line or end of input.
///
/// Calls `initialize` first and `finish` last. A failed push is reported to
/// git and does not end the session; protocol and I/O errors do.
pub async fn serve<H, R, W>(handler: &mut H, reader: R, mut writer: W) -> RemoteResult<()>
where
    H: ProtocolHandler + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    handler.initialize().await?;
    let mut lines = reader.lines();
    let mut batch: Vec<(String, String)> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let command = Command::parse(&line)?;
        debug!(?command, "remote-helper command");
        match command {
            Command::Capabilities => {
                for cap in handler.capabilities() {
                    writer.write_all(format!("{cap}\n").as_bytes()).await?;
                }
                writer.write_all(b"\n").await?;
            }
            Command::List { for_push } => {
                for entry in handler.list(for_push).await? {
                    writer.write_all(format!("{entry}\n").as_bytes()).await?;
                }
                writer.write_all(b"\n").await?;
            }
            Command::Option { name } => {
                debug!(name = %name, "option not supported");
                writer.write_all(b"unsupported\n").await?;
            }
            Command::Push { src, dst, .. } => batch.push((src, dst)),
            Command::Blank if !batch.is_empty() => {
                for (src, dst) in batch.drain(..) {
                    let reply = match handler.push(&src, &dst).await {
                        Ok(cid) => {
                            debug!(src = %src, dst = %dst, cid = %cid, "push ok");
                            format!("ok {dst}\n")
                        }
                        Err(e) => {
                            warn!(src = %src, dst = %dst, error = %e, "push failed");
                            format!("error {dst} {}\n", one_line(&e.to_string()))
                        }
                    };
                    writer.write_all(reply.as_bytes()).await?;
                }
                writer.write_all(b"\n").await?;
            }
            Command::Blank => break,
        }
        writer.flush().await?;
    }

    if !batch.is_empty() {
        let pending: Vec<String> = batch.into_iter().map(|(_, dst)| dst).collect();
        warn!(?pending, "input ended inside a push batch");
        return Err(RemoteError::UnterminatedBatch(pending));
    }
    handler.finish().await
}

fn one_line(message: &str) -> String {
    message.replace(['\n', '\r'], " ")
}
