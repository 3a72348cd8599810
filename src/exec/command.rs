// src/exec/command.rs

use std::io;
use std::process::Stdio;

use tokio::process::Command;

/// How chain commands are launched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Give children this terminal's stdin instead of `/dev/null`.
    pub attach_stdin: bool,
    /// Run each command through `sh -c` (`cmd /C` on Windows) instead of
    /// splitting it on whitespace and executing the program directly.
    pub shell: bool,
}

impl LaunchOptions {
    /// Whether children get their own process group (and are killed as a
    /// group).
    ///
    /// Not when stdin is attached: a child outside the terminal's foreground
    /// group would be stopped as soon as it reads from it.
    pub fn process_group(&self) -> bool {
        cfg!(unix) && !self.attach_stdin
    }
}

/// Build the `Command` for one chain entry.
///
/// stdout/stderr are inherited so output goes straight to the terminal.
/// Fails with `InvalidInput` for a command with no program.
pub fn build_command(command: &str, options: &LaunchOptions) -> io::Result<Command> {
    let mut cmd = if options.shell {
        shell_command(command)
    } else {
        let mut words = command.split_whitespace();
        let program = words.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "empty command")
        })?;
        let mut c = Command::new(program);
        c.args(words);
        c
    };

    let stdin = if options.attach_stdin {
        Stdio::inherit()
    } else {
        Stdio::null()
    };

    cmd.stdin(stdin)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    #[cfg(unix)]
    if options.process_group() {
        cmd.process_group(0);
    }

    Ok(cmd)
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}
