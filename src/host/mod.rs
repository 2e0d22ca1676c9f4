//! Line-oriented JSON host for a build session.
//!
//! Each input line is a [`Request`]; each produces exactly one [`Response`]
//! line. `stop` or end of input stops the session.
//!
//! Relative file paths in requests are resolved against the session's
//! workspace root.

mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub use types::*;

use crate::session::BuildSession;

/// Serve requests from stdin, writing responses to stdout.
pub async fn run_stdio(session: BuildSession) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(session, stdin, stdout).await
}

/// Serve requests until `stop` or end of input, then stop the session.
pub async fn serve<R, W>(session: BuildSession, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("build session host ready");
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (response, stop) = match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                debug!(?request, "request");
                let stop = request == Request::Stop;
                (handle(&session, request).await, stop)
            }
            Err(err) => {
                warn!(error = %err, "malformed request");
                (Response::error(format!("Invalid request: {err}")), false)
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;

        if stop {
            break;
        }
    }

    session.stop().await;
    Ok(())
}

/// Runs one request against the session.
pub async fn handle(session: &BuildSession, request: Request) -> Response {
    match request {
        Request::Compile { file } => match session.compile(&in_workspace(session, &file)).await {
            Ok(output) => Response::ok(ResponseBody::Compiled { output }),
            Err(err) => Response::error(err.to_string()),
        },
        Request::FileGroup { file } => match session.file_group(&in_workspace(session, &file)) {
            Some(group) => Response::ok(ResponseBody::Group { group }),
            None => Response::error(format!("{} has not been compiled", file.display())),
        },
        Request::Rebuild => {
            let report = session.rebuild().await;
            Response::ok(ResponseBody::Rebuilt(RebuildSummary::from(&report)))
        }
        Request::Invalidate => {
            session.invalidate().await;
            Response::ok(ResponseBody::Done {})
        }
        // Stopping consumes the session; `serve` does it after replying.
        Request::Stop => Response::ok(ResponseBody::Done {}),
    }
}

fn in_workspace(session: &BuildSession, file: &Path) -> PathBuf {
    session.path_mapper().workspace_root().join(file)
}
