//! Output demultiplexing.
//!
//! A synthesized program prints [`SENTINEL`] once per history entry before
//! that entry's code runs. Splitting the combined stdout/stderr stream on the
//! marker gives one segment per entry: segment 0 is whatever was printed
//! before the first marker (typically compiler diagnostics) and segment `i`
//! belongs to entry `i`.

/// Marker printed at every cell boundary of a synthesized program.
pub const SENTINEL: &str = "!!output-start-cell";

/// Separators that may follow the marker. The marker and its separator are
/// consumed together.
const SEPARATORS: [&str; 5] = ["\r\n", "\n", ",", "\"", " "];

/// Accumulates process output and extracts the segment of one cell.
///
/// The whole buffer is re-split on every chunk because a marker may straddle
/// two chunks.
#[derive(Debug, Clone)]
pub struct OutputDemultiplexer {
    buffer: Vec<u8>,
    target: usize,
}

impl OutputDemultiplexer {
    /// Demultiplex towards segment `target` (1-based).
    pub fn new(target: usize) -> Self {
        Self {
            buffer: Vec::new(),
            target,
        }
    }

    /// Segment this demultiplexer reports.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Whether the process printed anything besides boundary markers.
    pub fn has_output(&self) -> bool {
        split_segments(&decode(&self.buffer))
            .iter()
            .any(|segment| !segment.trim().is_empty())
    }

    /// Append a chunk and return the visible output, if any.
    pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
        self.buffer.extend_from_slice(chunk);
        self.visible()
    }

    /// All segments of the settled part of the buffer.
    ///
    /// A trailing partial marker, or a marker whose separator has not arrived
    /// yet, is held back until the next chunk.
    pub fn segments(&self) -> Vec<String> {
        let text = decode(&self.buffer);
        let settled = &text[..settled_len(&text)];
        split_segments(settled)
    }

    /// Trimmed output of the target segment while the process runs.
    pub fn visible(&self) -> Option<String> {
        self.segments()
            .get(self.target)
            .map(|segment| segment.trim().to_string())
            .filter(|segment| !segment.is_empty())
    }

    /// Output to keep once the process has exited.
    ///
    /// When the target segment was never reached (a compile error, or an
    /// earlier cell failing) the last segment is shown instead, since that is
    /// where the process stopped.
    pub fn final_output(&self) -> Option<String> {
        let segments = split_segments(&decode(&self.buffer));
        let segment = match segments.get(self.target) {
            Some(segment) => segment,
            None => segments.last()?,
        };

        let trimmed = segment.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Split text on the marker followed by one separator.
fn split_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut search = 0;

    while let Some(found) = text[search..].find(SENTINEL) {
        let at = search + found;
        let after = at + SENTINEL.len();
        match SEPARATORS.iter().find(|sep| text[after..].starts_with(**sep)) {
            Some(sep) => {
                segments.push(text[start..at].to_string());
                start = after + sep.len();
                search = start;
            }
            None => search = after,
        }
    }

    segments.push(text[start..].to_string());
    segments
}

/// Length of `text` without a trailing, possibly incomplete, marker.
fn settled_len(text: &str) -> usize {
    // A complete marker with no separator yet.
    if text.ends_with(SENTINEL) {
        return text.len() - SENTINEL.len();
    }
    // A marker split before "\r\n" is complete.
    if let Some(rest) = text.strip_suffix('\r')
        && rest.ends_with(SENTINEL)
    {
        return rest.len() - SENTINEL.len();
    }

    (1..SENTINEL.len())
        .rev()
        .find(|&n| text.ends_with(&SENTINEL[..n]))
        .map_or(text.len(), |n| text.len() - n)
}

/// Decode bytes as UTF-8, leaving out an incomplete trailing sequence.
fn decode(bytes: &[u8]) -> String {
    let complete = match std::str::from_utf8(bytes) {
        Ok(_) => bytes,
        Err(e) if e.error_len().is_none() => &bytes[..e.valid_up_to()],
        Err(_) => bytes,
    };
    String::from_utf8_lossy(complete).into_owned()
}
