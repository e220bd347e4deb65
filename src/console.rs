use crate::session::Surface;
use crate::transcript::{Role, Turn};
use std::io::Write;

/// Plain-text surface for a terminal or any other `Write` sink.
pub struct ConsoleSurface<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn show_error(&mut self, err: &anyhow::Error) -> anyhow::Result<()> {
        writeln!(self.out, "error: {err:#}\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn header(&mut self, role: Role) -> anyhow::Result<()> {
        writeln!(self.out, "[{}]", role.as_str())?;
        Ok(())
    }
}

impl<W: Write> Surface for ConsoleSurface<W> {
    fn notice(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "🗝️  {text}")?;
        self.out.flush()?;
        Ok(())
    }

    fn render_turn(&mut self, turn: &Turn) -> anyhow::Result<()> {
        self.header(turn.role())?;
        writeln!(self.out, "{}\n", turn.content().trim_end())?;
        self.out.flush()?;
        Ok(())
    }

    fn begin_stream(&mut self, role: Role) -> anyhow::Result<()> {
        self.header(role)
    }

    fn render_fragment(&mut self, text: &str) -> anyhow::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    fn end_stream(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "\n")?;
        self.out.flush()?;
        Ok(())
    }
}
