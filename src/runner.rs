use std::error::Error;
use std::path::Path;
use std::process::Command;

/// Captured result of one test-runner invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, for display.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Split a command string into argv using POSIX shell-word rules.
pub fn split_command(command: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let argv = shlex::split(command)
        .ok_or_else(|| format!("cannot parse test command '{}'", command))?;
    if argv.is_empty() {
        return Err("test command is empty".into());
    }
    Ok(argv)
}

/// Run the test command in `dir` with `env` layered on the inherited environment.
///
/// A non-zero exit prints everything the command wrote and returns an error.
pub fn run_test_command(
    command: &str,
    dir: &Path,
    env: &[(String, String)],
) -> Result<CommandOutput, Box<dyn Error>> {
    let argv = split_command(command)?;
    log::info!("{}", command);
    for (key, value) in env {
        log::debug!("env {}={}", key, value);
    }
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .current_dir(dir)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .output()
        .map_err(|e| format!("failed to start test command '{}': {}", command, e))?;

    let captured = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !output.status.success() {
        println!("{}", captured.combined());
        return Err(format!("test command '{}' failed ({})", command, output.status).into());
    }
    Ok(captured)
}
