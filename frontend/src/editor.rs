//! Interactive line source: rustyline with history and command completion.

use std::io;
use std::path::PathBuf;

use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use scanline_core::monitor::module::complete;
use scanline_core::monitor::{Completion, LineSource};

#[derive(Helper, Highlighter, Hinter, Validator)]
struct MonitorHelper {
    tree: Vec<Completion>,
}

/// Start of the word under the cursor and the candidates for it.
fn complete_line(tree: &[Completion], line: &str, pos: usize) -> (usize, Vec<String>) {
    let head = &line[..pos];
    let start = head
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + head[i..].chars().next().map_or(1, char::len_utf8));
    let words: Vec<&str> = head[..start].split_whitespace().collect();
    (start, complete(tree, &words, &head[start..]))
}

impl Completer for MonitorHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(complete_line(&self.tree, line, pos))
    }
}

pub struct EditorSource {
    editor: Editor<MonitorHelper, DefaultHistory>,
    history: Option<PathBuf>,
}

impl EditorSource {
    pub fn new(tree: Vec<Completion>, history: Option<PathBuf>) -> rustyline::Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(MonitorHelper { tree }));
        if let Some(path) = &history
            && let Err(e) = editor.load_history(path)
        {
            tracing::debug!("no history loaded from {}: {e}", path.display());
        }
        Ok(Self { editor, history })
    }

    pub fn save_history(&mut self) {
        let Some(path) = &self.history else {
            return;
        };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = self.editor.save_history(path) {
            tracing::warn!("failed to save history to {}: {e}", path.display());
        }
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    return Ok(Some(line));
                }
                // Ctrl-C abandons the line being edited.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
    }
}
