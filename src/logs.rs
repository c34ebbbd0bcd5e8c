// src/logs.rs

//! Reading service and task logs.

use std::path::Path;

use crate::errors::{Result, TaskvisorError};
use crate::exec::{OutputMode, ToolInvocation, ToolRunner};
use crate::fs::FileSystem;
use crate::types::Editor;

/// Last `lines` lines of the file at `path`, oldest first.
pub fn tail(fs: &dyn FileSystem, path: &Path, lines: usize) -> Result<Vec<String>> {
    if !fs.is_file(path) {
        return Err(TaskvisorError::PathNotFound(path.to_path_buf()));
    }
    let contents = fs.read_to_string(path)?;
    let all: Vec<&str> = contents.lines().collect();
    let start = all.len().saturating_sub(lines);
    Ok(all[start..].iter().map(|l| l.to_string()).collect())
}

/// Build the invocation that opens `path` in `editor` on the given OS.
///
/// Terminal editors on macOS get their own Terminal window via `osascript`.
pub fn editor_invocation(editor: Editor, path: &Path, os: &str) -> Result<ToolInvocation> {
    let target = path.display().to_string();
    let invocation = match (editor, os) {
        (Editor::Code, _) | (Editor::Vim | Editor::Nano, "linux") => {
            ToolInvocation::new(editor.program(), vec![target])
        }
        (Editor::Vim | Editor::Nano, "macos") => {
            let script = format!(
                "tell application \"Terminal\"\n    do script \"{} {}\"\n    activate\nend tell",
                editor.program(),
                target
            );
            ToolInvocation::new("osascript", vec!["-e".to_string(), script])
        }
        (_, other) => {
            return Err(TaskvisorError::Other(anyhow::anyhow!(
                "unsupported operating system: {other}"
            )));
        }
    };
    Ok(invocation.with_mode(OutputMode::Interactive))
}

pub async fn open_in_editor<T: ToolRunner>(
    fs: &dyn FileSystem,
    tools: &T,
    editor: Editor,
    path: &Path,
) -> Result<()> {
    if !fs.is_file(path) {
        return Err(TaskvisorError::PathNotFound(path.to_path_buf()));
    }
    let invocation = editor_invocation(editor, path, std::env::consts::OS)?;
    tools.run(invocation).await?;
    Ok(())
}
