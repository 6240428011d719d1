//! Stage trait and the command loop shared by every pipeline block.

use std::io::{Read, Write};

use crate::command::Command;
use crate::error::PipeError;
use crate::protocol::Opcode;
use crate::stream::{CommandReader, CommandWriter};

/// One pipeline block: consumes a command stream, produces the next one.
///
/// Implementations hold all of their state (matrices, pipeline state,
/// buffers) and mutate it only from [`Stage::handle`].
pub trait Stage {
    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Command words this stage interprets. Everything else is forwarded.
    fn decode_table(&self) -> &'static [Opcode];

    /// Process one interpreted command, writing any output to `out`.
    fn handle<W: Write>(
        &mut self,
        cmd: Command,
        out: &mut CommandWriter<W>,
    ) -> Result<(), PipeError>;
}

/// Counters collected while a stage runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Commands the stage interpreted.
    pub handled: u64,
    /// Commands forwarded unchanged.
    pub forwarded: u64,
    /// Commands written to the output stream, forwarded ones included.
    pub emitted: u64,
}

/// Run `stage` until its input ends.
///
/// Commands outside the stage's decode table are forwarded with exactly their
/// declared payload and the output is flushed after each one. Any error is
/// returned immediately; there is no resynchronization.
pub fn run_stage<S, R, W>(
    stage: &mut S,
    input: R,
    output: W,
) -> Result<StageReport, PipeError>
where
    S: Stage,
    R: Read,
    W: Write,
{
    let mut reader = CommandReader::new(input);
    let mut writer = CommandWriter::new(output);
    let mut report = StageReport::default();
    let table = stage.decode_table();

    log::info!("{}: running", stage.name());

    while let Some(cmd) = reader.next_command(table)? {
        match cmd {
            Command::Passthrough(raw) => {
                log::trace!("{}: forward {:#010X}", stage.name(), raw.word);
                writer.forward(&raw)?;
                writer.flush()?;
                report.forwarded += 1;
            }
            cmd => {
                log::trace!("{}: handle {:#010X}", stage.name(), cmd.word());
                stage.handle(cmd, &mut writer)?;
                report.handled += 1;
            }
        }
    }

    writer.flush()?;
    report.emitted = writer.emitted();
    log::info!(
        "{}: input closed after {} handled, {} forwarded, {} emitted",
        stage.name(),
        report.handled,
        report.forwarded,
        report.emitted
    );
    Ok(report)
}
