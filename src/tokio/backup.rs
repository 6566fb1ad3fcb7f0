//! Async BASE_BACKUP entry points.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::opts::BackupOpts;
use crate::result_set::{ReadProgress, ResultSet, ResultSetReader};
use crate::state::{Action, BackupResult, BaseBackupStateMachine};

use super::source::AsyncMessageSource;

/// Run the bare `BASE_BACKUP` command, streaming the backup into `sink`.
///
/// The sink receives exactly the concatenated CopyData payloads. On error the
/// sink may hold a partial stream; truncating it is up to the caller.
pub async fn run_base_backup<S, W>(source: &mut S, sink: &mut W) -> Result<BackupResult>
where
    S: AsyncMessageSource,
    W: AsyncWrite + Unpin,
{
    drive(source, sink, BaseBackupStateMachine::new()).await
}

/// Like [`run_base_backup`], with the command rendered from `opts`.
pub async fn run_base_backup_with_opts<S, W>(
    source: &mut S,
    sink: &mut W,
    opts: &BackupOpts,
) -> Result<BackupResult>
where
    S: AsyncMessageSource,
    W: AsyncWrite + Unpin,
{
    drive(source, sink, BaseBackupStateMachine::with_opts(opts)?).await
}

async fn drive<S, W>(
    source: &mut S,
    sink: &mut W,
    mut state_machine: BaseBackupStateMachine,
) -> Result<BackupResult>
where
    S: AsyncMessageSource,
    W: AsyncWrite + Unpin,
{
    match state_machine.start()? {
        Action::WritePacket(packet) => source.send(packet).await?,
        _ => return Err(Error::Protocol("Unexpected initial action".into())),
    }

    loop {
        let msg = source.receive().await?;
        match state_machine.step(msg)? {
            Action::ReadMessage => {}
            Action::WriteOutput(data) => sink.write_all(data).await.map_err(Error::Sink)?,
            Action::WritePacket(packet) => source.send(packet).await?,
            Action::Finished => break,
        }
    }

    sink.flush().await.map_err(Error::Sink)?;
    state_machine.finish()
}

/// Receive one complete result set.
///
/// A message that cannot belong to a result set is a protocol error.
pub async fn read_result_set<S: AsyncMessageSource>(source: &mut S) -> Result<ResultSet> {
    let mut reader = ResultSetReader::new();
    loop {
        match reader.feed(source.receive().await?)? {
            ReadProgress::Pending => {}
            ReadProgress::Complete(result_set) => return Ok(result_set),
            ReadProgress::Unhandled(msg) => {
                return Err(Error::Protocol(format!(
                    "unexpected message {} in result set",
                    msg.kind()
                )));
            }
        }
    }
}
