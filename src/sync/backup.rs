//! Blocking BASE_BACKUP entry points.

use std::io::Write;

use crate::error::{Error, Result};
use crate::opts::BackupOpts;
use crate::result_set::{ReadProgress, ResultSet, ResultSetReader};
use crate::state::{Action, BackupResult, BaseBackupStateMachine};

use super::source::MessageSource;

/// Run the bare `BASE_BACKUP` command, streaming the backup into `sink`.
///
/// The sink receives exactly the concatenated CopyData payloads. On error the
/// sink may hold a partial stream; truncating it is up to the caller.
pub fn run_base_backup<S, W>(source: &mut S, sink: &mut W) -> Result<BackupResult>
where
    S: MessageSource + ?Sized,
    W: Write + ?Sized,
{
    drive(source, sink, BaseBackupStateMachine::new())
}

/// Like [`run_base_backup`], with the command rendered from `opts`.
pub fn run_base_backup_with_opts<S, W>(
    source: &mut S,
    sink: &mut W,
    opts: &BackupOpts,
) -> Result<BackupResult>
where
    S: MessageSource + ?Sized,
    W: Write + ?Sized,
{
    drive(source, sink, BaseBackupStateMachine::with_opts(opts)?)
}

fn drive<S, W>(
    source: &mut S,
    sink: &mut W,
    mut state_machine: BaseBackupStateMachine,
) -> Result<BackupResult>
where
    S: MessageSource + ?Sized,
    W: Write + ?Sized,
{
    match state_machine.start()? {
        Action::WritePacket(packet) => source.send(packet)?,
        _ => return Err(Error::Protocol("Unexpected initial action".into())),
    }

    loop {
        let msg = source.receive()?;
        match state_machine.step(msg)? {
            Action::ReadMessage => {}
            Action::WriteOutput(data) => sink.write_all(data).map_err(Error::Sink)?,
            Action::WritePacket(packet) => source.send(packet)?,
            Action::Finished => break,
        }
    }

    sink.flush().map_err(Error::Sink)?;
    state_machine.finish()
}

/// Receive one complete result set.
///
/// A message that cannot belong to a result set is a protocol error.
pub fn read_result_set<S: MessageSource + ?Sized>(source: &mut S) -> Result<ResultSet> {
    let mut reader = ResultSetReader::new();
    loop {
        match reader.feed(source.receive()?)? {
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
