//! BASE_BACKUP protocol state machine.
//!
//! The exchange has three phases:
//!
//! 1. A result set with one row: start position (text LSN) and timeline id.
//! 2. A result set with one row per tablespace (`spcoid`, `spclocation`, `size`).
//! 3. A COPY stream: CopyOutResponse, CopyData*, CopyDone.
//!
//! Every CopyData payload is handed to the caller untouched, in arrival order.

use crate::error::{Error, Result};
use crate::lsn::Lsn;
use crate::message::BackendMessage;
use crate::opts::BackupOpts;
use crate::protocol::codec::read_u32;
use crate::protocol::frontend::write_query;
use crate::protocol::types::Oid;
use crate::result_set::{FieldIndex, ReadProgress, ResultSet, ResultSetReader, Row};

use super::action::Action;

/// Columns the tablespace result set must carry.
pub const TABLESPACE_FIELDS: [&str; 3] = ["spcoid", "spclocation", "size"];

/// A tablespace included in the backup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tablespace {
    /// Tablespace OID; `None` for the main data directory
    pub oid: Option<Oid>,
    /// Server-side path; empty for the main data directory
    pub location: String,
    /// Size as reported by the server; `None` when not computed
    pub size: Option<u8>,
}

/// Outcome of a completed BASE_BACKUP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupResult {
    /// WAL position at which the backup starts
    pub start_position: Lsn,
    /// Timeline of the start position
    pub timeline_id: u8,
    /// Tablespaces in server order
    pub tablespaces: Vec<Tablespace>,
}

/// State machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    AwaitStart,
    AwaitTablespaces,
    AwaitCopy,
    Streaming,
    Done,
    Failed,
}

/// What the driver must do after a transition.
enum Next {
    Read,
    Output,
    Finished,
}

/// BASE_BACKUP state machine.
///
/// Call [`start`](Self::start) once, then feed every received message to
/// [`step`](Self::step) until it returns [`Action::Finished`]. Any error leaves
/// the machine failed; the exchange cannot be resumed.
pub struct BaseBackupStateMachine {
    state: State,
    command: String,
    write_buffer: Vec<u8>,
    output: Vec<u8>,
    reader: ResultSetReader,
    result: BackupResult,
    bytes_streamed: u64,
    chunks_streamed: u64,
}

impl BaseBackupStateMachine {
    /// State machine issuing the bare `BASE_BACKUP` command.
    pub fn new() -> Self {
        Self::with_command(String::from("BASE_BACKUP"))
    }

    /// State machine issuing the command rendered from `opts`.
    pub fn with_opts(opts: &BackupOpts) -> Result<Self> {
        Ok(Self::with_command(opts.command()?))
    }

    fn with_command(command: String) -> Self {
        Self {
            state: State::Init,
            command,
            write_buffer: Vec::new(),
            output: Vec::new(),
            reader: ResultSetReader::new(),
            result: BackupResult::default(),
            bytes_streamed: 0,
            chunks_streamed: 0,
        }
    }

    /// The command text sent to the server.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Encode the command. The returned packet must be written before any
    /// message is read.
    pub fn start(&mut self) -> Result<Action<'_>> {
        if self.state != State::Init {
            return Err(Error::InvalidUsage(format!(
                "BASE_BACKUP already started (state {:?})",
                self.state
            )));
        }
        self.write_buffer.clear();
        write_query(&mut self.write_buffer, &self.command);
        self.state = State::AwaitStart;
        tracing::debug!(command = %self.command, "sending base backup command");
        Ok(Action::WritePacket(&self.write_buffer))
    }

    /// Process a message from the server.
    pub fn step(&mut self, msg: BackendMessage) -> Result<Action<'_>> {
        match self.transition(msg) {
            Ok(Next::Read) => Ok(Action::ReadMessage),
            Ok(Next::Output) => Ok(Action::WriteOutput(&self.output)),
            Ok(Next::Finished) => Ok(Action::Finished),
            Err(e) => {
                if !matches!(e, Error::InvalidUsage(_)) {
                    self.state = State::Failed;
                }
                Err(e)
            }
        }
    }

    /// Whether the end of the COPY stream has been reached.
    pub fn is_finished(&self) -> bool {
        self.state == State::Done
    }

    /// Total CopyData payload bytes handed out so far.
    pub fn bytes_streamed(&self) -> u64 {
        self.bytes_streamed
    }

    /// Number of CopyData messages handed out so far.
    pub fn chunks_streamed(&self) -> u64 {
        self.chunks_streamed
    }

    /// Consume the state machine, returning the result of a finished exchange.
    pub fn finish(self) -> Result<BackupResult> {
        if self.state != State::Done {
            return Err(Error::Protocol(format!(
                "BASE_BACKUP did not complete (state {:?})",
                self.state
            )));
        }
        Ok(self.result)
    }

    fn transition(&mut self, msg: BackendMessage) -> Result<Next> {
        match self.state {
            State::AwaitStart => {
                let Some(result_set) = self.read_result_set(msg)? else {
                    return Ok(Next::Read);
                };
                self.handle_start(&result_set)?;
                self.state = State::AwaitTablespaces;
                Ok(Next::Read)
            }
            State::AwaitTablespaces => {
                let Some(result_set) = self.read_result_set(msg)? else {
                    return Ok(Next::Read);
                };
                self.handle_tablespaces(&result_set)?;
                self.state = State::AwaitCopy;
                Ok(Next::Read)
            }
            State::AwaitCopy => match msg {
                BackendMessage::CopyOutResponse(response) => {
                    tracing::debug!(binary = response.is_binary(), "backup stream starting");
                    self.state = State::Streaming;
                    Ok(Next::Read)
                }
                BackendMessage::ErrorResponse(fields) => Err(Error::Server(fields)),
                other => Err(unexpected(&other, "waiting for CopyOutResponse")),
            },
            State::Streaming => match msg {
                BackendMessage::CopyData(data) => {
                    tracing::trace!(len = data.len(), "backup chunk");
                    self.bytes_streamed += data.len() as u64;
                    self.chunks_streamed += 1;
                    self.output = data;
                    Ok(Next::Output)
                }
                BackendMessage::CopyDone => {
                    self.output.clear();
                    self.state = State::Done;
                    tracing::info!(
                        start_position = %self.result.start_position,
                        bytes = self.bytes_streamed,
                        chunks = self.chunks_streamed,
                        "base backup stream complete"
                    );
                    Ok(Next::Finished)
                }
                BackendMessage::ErrorResponse(fields) => Err(Error::Server(fields)),
                other => Err(unexpected(&other, "streaming backup data")),
            },
            State::Init => Err(Error::InvalidUsage(
                "step() called before start()".into(),
            )),
            State::Done | State::Failed => Err(Error::InvalidUsage(format!(
                "step() called in terminal state {:?}",
                self.state
            ))),
        }
    }

    fn read_result_set(&mut self, msg: BackendMessage) -> Result<Option<ResultSet>> {
        match self.reader.feed(msg)? {
            ReadProgress::Pending => Ok(None),
            ReadProgress::Complete(result_set) => Ok(Some(result_set)),
            ReadProgress::Unhandled(other) => Err(unexpected(&other, "reading a result set")),
        }
    }

    fn handle_start(&mut self, result_set: &ResultSet) -> Result<()> {
        let [row] = result_set.rows.as_slice() else {
            return Err(Error::Protocol(format!(
                "expected 1 row in start position result set, {} found",
                result_set.rows.len()
            )));
        };

        let position = column(row, 0).ok_or_else(|| {
            Error::Protocol("start position column is missing or NULL".into())
        })?;
        // LSN text is ASCII; anything else fails the hex check
        let start_position = Lsn::parse(&String::from_utf8_lossy(position))?;

        let timeline_id = column(row, 1)
            .and_then(<[u8]>::first)
            .copied()
            .ok_or_else(|| Error::Protocol("timeline id column is missing or empty".into()))?;

        self.result.start_position = start_position;
        self.result.timeline_id = timeline_id;
        tracing::info!(start_position = %start_position, timeline_id, "base backup started");
        Ok(())
    }

    fn handle_tablespaces(&mut self, result_set: &ResultSet) -> Result<()> {
        let index = FieldIndex::new(result_set, &TABLESPACE_FIELDS)?;

        let mut tablespaces = Vec::with_capacity(result_set.rows.len());
        for row in &result_set.rows {
            let oid = match non_empty(index.value(row, "spcoid")?) {
                Some(bytes) => Some(decode_oid(bytes)?),
                None => None,
            };
            // paths follow the server encoding; never fail on them
            let location = index
                .value(row, "spclocation")?
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default();
            let size = non_empty(index.value(row, "size")?).and_then(<[u8]>::first).copied();

            tracing::debug!(?oid, location = %location, ?size, "tablespace");
            tablespaces.push(Tablespace {
                oid,
                location,
                size,
            });
        }

        self.result.tablespaces = tablespaces;
        Ok(())
    }
}

impl Default for BaseBackupStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn column(row: &Row, index: usize) -> Option<&[u8]> {
    row.get(index).and_then(Option::as_deref)
}

fn non_empty(value: Option<&[u8]>) -> Option<&[u8]> {
    value.filter(|bytes| !bytes.is_empty())
}

/// OIDs arrive as a 4-byte big-endian integer.
fn decode_oid(bytes: &[u8]) -> Result<Oid> {
    let (oid, rest) = read_u32(bytes)?;
    if !rest.is_empty() {
        return Err(Error::Protocol(format!(
            "spcoid: expected 4 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(oid)
}

fn unexpected(msg: &BackendMessage, phase: &str) -> Error {
    Error::Protocol(format!("unexpected message {} while {phase}", msg.kind()))
}
