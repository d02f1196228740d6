//! Interactive location prompt.

use log::info;
use memo_core::LocationPicker;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

/// Asks for a storage directory on a line-based reader.
///
/// An empty answer, end of input, or a read error cancel the request.
pub struct PromptPicker<R, W> {
    input: R,
    output: W,
}

impl PromptPicker<BufReader<io::Stdin>, io::Stderr> {
    /// Prompts on stderr and reads the answer from stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> LocationPicker for PromptPicker<R, W> {
    fn pick_location(&mut self) -> Option<PathBuf> {
        let _ = write!(self.output, "memo storage directory (empty to cancel): ");
        let _ = self.output.flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = answer.trim();
                if trimmed.is_empty() {
                    info!("event=location_prompt module=cli status=cancelled");
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PromptPicker;
    use memo_core::LocationPicker;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[test]
    fn answer_is_trimmed_into_a_path() {
        let mut output = Vec::new();
        let mut picker = PromptPicker::new(Cursor::new("  /srv/memos \n"), &mut output);
        assert_eq!(picker.pick_location(), Some(PathBuf::from("/srv/memos")));
        drop(picker);
        assert!(String::from_utf8(output).unwrap().contains("empty to cancel"));
    }

    #[test]
    fn empty_answer_or_eof_cancels() {
        let mut picker = PromptPicker::new(Cursor::new("\n"), Vec::new());
        assert_eq!(picker.pick_location(), None);

        let mut picker = PromptPicker::new(Cursor::new(""), Vec::new());
        assert_eq!(picker.pick_location(), None);
    }
}
