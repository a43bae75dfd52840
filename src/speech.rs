use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Announces each new target word. Fire-and-forget: nothing comes back.
pub trait Speaker {
    fn speak(&self, word: &str);
}

/// Speaker that says nothing, for `--mute` and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _word: &str) {}
}

/// Runs an external text-to-speech program with the word as last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Split a command line such as `espeak -s 120` on whitespace.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, word: &str) {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(word)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                // reap in the background so finished speakers don't linger as zombies
                thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(err) => debug!(program = %self.program, %err, "speech command failed to start"),
        }
    }
}

/// Speaker for the given command line; silent when muted or unset.
pub fn speaker_for(command_line: Option<&str>, mute: bool) -> Box<dyn Speaker> {
    match command_line.filter(|_| !mute).and_then(CommandSpeaker::parse) {
        Some(speaker) => Box::new(speaker),
        None => Box::new(SilentSpeaker),
    }
}
