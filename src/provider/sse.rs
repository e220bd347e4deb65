use anyhow::anyhow;

/// Minimal SSE parser.
///
/// - Buffers bytes until a full line is available
/// - Joins `data:` lines of one event with `\n`
/// - Emits the joined payload when a blank line ends the event
///
/// Other fields (`event:`, `id:`, `retry:`, comments) are dropped.
pub(crate) struct SseParser {
    buf: Vec<u8>,
    cur_data: Option<String>,
}

impl SseParser {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::new(),
            cur_data: None,
        }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<anyhow::Result<String>> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.drain(..=pos).collect::<Vec<u8>>();
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
            self.feed_line(&line, &mut out);
        }

        out
    }

    /// Flush whatever the peer left behind without a terminating blank line.
    pub(crate) fn finish(&mut self) -> Vec<anyhow::Result<String>> {
        let mut out = Vec::new();
        if !self.buf.is_empty() {
            let mut line = std::mem::take(&mut self.buf);
            if line.ends_with(b"\r") {
                line.pop();
            }
            self.feed_line(&line, &mut out);
        }
        if let Some(data) = self.cur_data.take() {
            out.push(Ok(data));
        }
        out
    }

    fn feed_line(&mut self, line: &[u8], out: &mut Vec<anyhow::Result<String>>) {
        if line.is_empty() {
            if let Some(data) = self.cur_data.take() {
                out.push(Ok(data));
            }
            return;
        }

        let s = match std::str::from_utf8(line) {
            Ok(s) => s,
            Err(e) => {
                out.push(Err(anyhow!(e).context("SSE line is not valid UTF-8")));
                return;
            }
        };

        if let Some(rest) = s.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            match &mut self.cur_data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(rest);
                }
                None => self.cur_data = Some(rest.to_string()),
            }
        }
    }
}
