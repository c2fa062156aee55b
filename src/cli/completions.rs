//! Completions command implementation
//!
//! The script is rendered into memory and printed by `main` like every other
//! command's output.

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::{generate, Shell};

/// Completion script for `shell`, bound to the `dispatch` binary name.
pub fn render_completions(shell: Shell) -> Result<String, std::string::FromUtf8Error> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    let mut script = Vec::new();
    generate(shell, &mut cmd, bin_name, &mut script);
    String::from_utf8(script)
}

/// Handle `dispatch completions` command
pub fn handle_completions(args: &CompletionsArgs) -> Result<String, Box<dyn std::error::Error>> {
    Ok(render_completions(args.shell)?)
}
