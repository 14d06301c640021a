use std::io::{self, BufRead};

/// Where the monitor reads its command lines from.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Commands read from a file or any other buffered reader. Lines starting
/// with `#` are skipped.
pub struct ScriptSource<R> {
    reader: R,
}

impl<R: BufRead> ScriptSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.trim_start().starts_with('#') {
                return Ok(Some(line.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_lines_and_comments() {
        let mut src = ScriptSource::new("m\n# skipped\n\nq\r\n".as_bytes());
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("m"));
        assert_eq!(src.read_line("").unwrap().as_deref(), Some(""));
        assert_eq!(src.read_line("").unwrap().as_deref(), Some("q"));
        assert_eq!(src.read_line("").unwrap(), None);
    }
}
