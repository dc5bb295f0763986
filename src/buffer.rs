//! Inbound byte accumulator with line-based prompt scanning.
//!
//! Device output arrives in arbitrary chunks; a prompt may be split across
//! chunks or buried behind a screenful of command output. The buffer strips
//! ANSI escape codes on ingest and scans only the tail of the accumulated
//! data for prompt lines, so large outputs (full routing tables) stay cheap
//! to check on every chunk.

use regex::Regex;

/// Default number of trailing bytes scanned for prompt lines.
const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Accumulates raw device output between prompts.
///
/// Append-only between clearings; `clear` resets the length without
/// reallocating.
#[derive(Debug)]
pub struct InputBuffer {
    buffer: Vec<u8>,
    search_depth: usize,
}

impl InputBuffer {
    /// Create a buffer that scans the last `search_depth` bytes for prompts.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.extend_stripped(&cleaned);
    }

    /// Extend the buffer with data already stripped of ANSI sequences.
    ///
    /// For callers that share one stripped copy between several sinks.
    pub fn extend_stripped(&mut self, cleaned: &[u8]) {
        self.buffer.extend_from_slice(cleaned);
    }

    /// Whether any complete line in the buffer tail is a prompt.
    ///
    /// A line is a prompt when its trimmed text matches `pattern`. Only
    /// lines wholly inside the final `search_depth` bytes are considered;
    /// the scan window is snapped forward to a newline boundary so a line
    /// cut in half by the window cannot produce a false match.
    pub fn has_prompt_line(&self, pattern: &Regex) -> bool {
        let tail = self.tail_window();
        let text = String::from_utf8_lossy(tail);
        text.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && pattern.is_match(line)
        })
    }

    /// Remove and return everything through the end of the first prompt
    /// line, leaving any following bytes in place.
    ///
    /// The consumed segment includes the prompt line and its trailing
    /// newline when present. Returns `None` (buffer untouched) when no
    /// complete line matches the pattern.
    pub fn take_through_prompt(&mut self, pattern: &Regex) -> Option<String> {
        let end = self.first_prompt_line_end(pattern)?;
        let consumed: Vec<u8> = self.buffer.drain(..end).collect();
        Some(String::from_utf8_lossy(&consumed).into_owned())
    }

    /// Byte offset just past the first line matching `pattern`.
    ///
    /// Works line by line on the raw bytes so offsets stay valid even when
    /// the buffer holds invalid UTF-8.
    fn first_prompt_line_end(&self, pattern: &Regex) -> Option<usize> {
        let mut start = 0;
        while start < self.buffer.len() {
            let end = match self.buffer[start..].iter().position(|&b| b == b'\n') {
                Some(i) => start + i + 1,
                None => self.buffer.len(),
            };
            let line = String::from_utf8_lossy(&self.buffer[start..end]);
            let trimmed = line.trim();
            if !trimmed.is_empty() && pattern.is_match(trimmed) {
                return Some(end);
            }
            start = end;
        }
        None
    }

    fn tail_window(&self) -> &[u8] {
        if self.buffer.len() <= self.search_depth {
            return &self.buffer;
        }
        let start = self.buffer.len() - self.search_depth;
        // Snap to the next line start; the skipped partial line began
        // outside the window.
        let window = &self.buffer[start..];
        match window.iter().position(|&b| b == b'\n') {
            Some(pos) => &window[pos + 1..],
            None => window,
        }
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get a reference to the raw contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer, keeping its allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junos_prompt() -> Regex {
        Regex::new(r"^[\w\-.]+@[\w\-.]+>\s*$").unwrap()
    }

    #[test]
    fn test_basic_extend() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_prompt_detection() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"show version\nJunos: 23.2R1\nuser@router> ");
        assert!(buffer.has_prompt_line(&junos_prompt()));
    }

    #[test]
    fn test_no_prompt_mid_line() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"the string user@router> is quoted here\n");
        assert!(!buffer.has_prompt_line(&junos_prompt()));
    }

    #[test]
    fn test_prompt_split_across_chunks() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"output line\nuser@rou");
        assert!(!buffer.has_prompt_line(&junos_prompt()));
        buffer.extend(b"ter> ");
        assert!(buffer.has_prompt_line(&junos_prompt()));
    }

    #[test]
    fn test_prompt_outside_search_depth() {
        let mut buffer = InputBuffer::new(50);
        buffer.extend(b"user@router> \n");
        buffer.extend(&[b'x'; 200]);
        assert!(!buffer.has_prompt_line(&junos_prompt()));
    }

    #[test]
    fn test_tail_window_snaps_to_line_boundary() {
        let mut buffer = InputBuffer::new(30);
        // Long line ending in something prompt-shaped, then a real line;
        // the partial cut of the long line must not match.
        buffer.extend(&[b'y'; 100]);
        buffer.extend(b" user@router>\nplain output\n");
        assert!(!buffer.has_prompt_line(&junos_prompt()));
    }

    #[test]
    fn test_prompt_without_trailing_newline() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"body\nuser@router>");
        assert!(buffer.has_prompt_line(&junos_prompt()));
    }

    #[test]
    fn test_take_through_prompt_consumes_prefix_only() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"show version\nbody\nuser@router> \nleftover");

        let segment = buffer.take_through_prompt(&junos_prompt()).unwrap();
        assert_eq!(segment, "show version\nbody\nuser@router> \n");
        assert_eq!(buffer.as_slice(), b"leftover");
    }

    #[test]
    fn test_take_through_prompt_without_prompt() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"partial output");

        assert!(buffer.take_through_prompt(&junos_prompt()).is_none());
        assert_eq!(buffer.as_slice(), b"partial output");
    }

    #[test]
    fn test_take_through_prompt_one_at_a_time() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"a\nuser@r1> \nb\nuser@r2> ");

        assert_eq!(
            buffer.take_through_prompt(&junos_prompt()).unwrap(),
            "a\nuser@r1> \n"
        );
        assert_eq!(
            buffer.take_through_prompt(&junos_prompt()).unwrap(),
            "b\nuser@r2> "
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_through_prompt_at_buffer_end_without_newline() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"output\nuser@router>");

        let segment = buffer.take_through_prompt(&junos_prompt()).unwrap();
        assert_eq!(segment, "output\nuser@router>");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffer = InputBuffer::default();
        buffer.extend(b"some data");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }
}
