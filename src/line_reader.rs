use anyhow::{Context, Result};
use std::io::BufRead;

/**
 * Reads a script line by line, keeping track of the line number for error messages. Lines that are empty
 * or start with `#` are skipped.
 */
pub struct LineReader<'a> {
    reader: &'a mut dyn BufRead,
    line_no: usize,
    line: String,
}

impl<'a> LineReader<'a> {
    pub fn new(reader: &'a mut (dyn BufRead + 'a)) -> Self {
        LineReader::<'a> {
            reader: reader,
            line_no: 0,
            line: String::new(),
        }
    }

    pub fn get_last_line_number(&self) -> usize {
        self.line_no
    }

    pub fn get_last_line(&self) -> &str {
        &self.line
    }

    /// Reads the next physical line; returns false at the end of the input.
    pub fn next_line_raw(&mut self) -> Result<bool> {
        self.line.clear();

        let read = self
            .reader
            .read_line(&mut self.line)
            .with_context(|| format!("failed to read line {}", self.line_no + 1))?;
        if read == 0 {
            return Ok(false);
        }
        if self.line.ends_with('\n') {
            self.line.pop();
            if self.line.ends_with('\r') {
                self.line.pop();
            }
        }
        self.line_no += 1;
        Ok(true)
    }

    /// Reads the next line with content, trimmed; returns None at the end of the input.
    pub fn next_line(&mut self) -> Result<Option<&str>> {
        loop {
            if !self.next_line_raw()? {
                return Ok(None);
            }
            let trimmed = self.line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                break;
            }
        }
        Ok(Some(self.line.trim()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use super::LineReader;

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "# header\nint x\n\n   # indented comment\r\n x <= 3 \r\n";
        let mut reader = BufReader::new(text.as_bytes());
        let mut lines = LineReader::new(&mut reader);

        assert_eq!(lines.next_line().unwrap(), Some("int x"));
        assert_eq!(lines.get_last_line_number(), 2);
        assert_eq!(lines.next_line().unwrap(), Some("x <= 3"));
        assert_eq!(lines.get_last_line_number(), 5);
        assert_eq!(lines.next_line().unwrap(), None);
    }
}
