use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, error, info, warn};
use crate::drivers::source::{LineSource, StopFlag};
use crate::drivers::SweepError;
pub const DEFAULT_SWEEP_COMMAND: &str = "hackrf_sweep";
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Exit status the POSIX shell uses when the command itself cannot be found.
const SHELL_NOT_FOUND: i32 = 127;
/// A command string and the shell that runs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellCommand {
    pub shell: String,
    pub flag: String,
    pub command: String,
}
impl ShellCommand {
    /// `sh -c <command>` on unix, `cmd /C <command>` on windows.
    pub fn platform(command: impl Into<String>) -> Self {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        Self {
            shell: shell.to_string(),
            flag: flag.to_string(),
            command: command.into(),
        }
    }
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.flag)
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so termination reaches whatever the shell starts.
            cmd.process_group(0);
        }
        cmd
    }
}
/// Owns one running sweep tool process.
pub struct SweepProcess {
    command: String,
    child: Child,
    lines: Option<SweepLines>,
    stderr_drain: Option<JoinHandle<()>>,
    stop: StopFlag,
    grace: Duration,
    exit: Option<ExitStatus>,
}
impl SweepProcess {
    pub fn start(command: &ShellCommand, grace: Duration) -> Result<Self, SweepError> {
        let mut child = command.build().spawn().map_err(|source| SweepError::Spawn {
            command: command.command.clone(),
            source,
        })?;
        info!("started `{}` (pid {})", command.command, child.id());
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SweepError::MissingStdout);
        };
        let stderr_drain = match child.stderr.take() {
            Some(stderr) => Some(spawn_stderr_drain(stderr)?),
            None => None,
        };
        let stop = StopFlag::new();
        Ok(Self {
            command: command.command.clone(),
            child,
            lines: Some(SweepLines::new(stdout, stop.clone())),
            stderr_drain,
            stop,
            grace,
            exit: None,
        })
    }
    /// The stdout reader; handed out once.
    pub fn lines(&mut self) -> Option<SweepLines> {
        self.lines.take()
    }
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }
    /// Raises the stop flag, terminates the process and waits for it.
    ///
    /// A termination request goes out first; once `grace` elapses the process is
    /// killed. Calling it again returns the recorded exit status.
    pub fn stop(&mut self) -> Result<ExitStatus, SweepError> {
        self.stop.request_stop();
        if let Some(status) = self.exit {
            return Ok(status);
        }
        // The shell may be gone while its children still hold stdout open.
        let status = self.terminate()?;
        self.exit = Some(status);
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        report_exit(&self.command, status);
        Ok(status)
    }
    /// Signals the whole process group, then waits for the leader to be reaped
    /// and the rest of the group to exit.
    fn terminate(&mut self) -> Result<ExitStatus, SweepError> {
        let group = self.child.id();
        request_termination(group);
        let deadline = Instant::now() + self.grace;
        let mut status = None;
        loop {
            if status.is_none() {
                status = self.child.try_wait()?;
            }
            if let Some(status) = status {
                if !group_alive(group) {
                    return Ok(status);
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
        warn!(
            "`{}` still running after {:?}, killing it",
            self.command, self.grace
        );
        force_kill(&mut self.child);
        match status {
            Some(status) => Ok(status),
            None => Ok(self.child.wait()?),
        }
    }
}
impl Drop for SweepProcess {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            error!("failed to stop `{}`: {err}", self.command);
        }
    }
}
#[cfg(unix)]
fn signal_group(group: u32, signal: Option<nix::sys::signal::Signal>) -> nix::Result<()> {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;
    killpg(Pid::from_raw(group as i32), signal)
}
#[cfg(unix)]
fn request_termination(group: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::Signal;
    match signal_group(group, Some(Signal::SIGTERM)) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => debug!("SIGTERM to process group {group} failed: {err}"),
    }
}
#[cfg(not(unix))]
fn request_termination(_group: u32) {}
/// Whether any member of the tool's process group is still around.
#[cfg(unix)]
fn group_alive(group: u32) -> bool {
    signal_group(group, None).is_ok()
}
#[cfg(not(unix))]
fn group_alive(_group: u32) -> bool {
    false
}
#[cfg(unix)]
fn force_kill(child: &mut Child) {
    use nix::sys::signal::Signal;
    let _ = signal_group(child.id(), Some(Signal::SIGKILL));
    let _ = child.kill();
}
#[cfg(not(unix))]
fn force_kill(child: &mut Child) {
    let _ = child.kill();
}
fn report_exit(command: &str, status: ExitStatus) {
    match status.code() {
        Some(0) => info!("`{command}` exited cleanly"),
        Some(SHELL_NOT_FOUND) => error!("`{command}`: command not found"),
        Some(code) => warn!("`{command}` exited with status {code}"),
        None => info!("`{command}` terminated by signal"),
    }
}
fn spawn_stderr_drain(stderr: impl Read + Send + 'static) -> Result<JoinHandle<()>, SweepError> {
    let handle = thread::Builder::new()
        .name("sweep-stderr".into())
        .spawn(move || {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) if line.trim().is_empty() => {}
                    Ok(line) => warn!(target: "sweep_tool", "{line}"),
                    Err(_) => break,
                }
            }
        })?;
    Ok(handle)
}
/// Blocking line reader over the tool's stdout.
pub struct SweepLines {
    reader: BufReader<Box<dyn Read + Send>>,
    stop: StopFlag,
    buf: Vec<u8>,
}
impl SweepLines {
    fn new(stdout: ChildStdout, stop: StopFlag) -> Self {
        Self::from_reader(stdout, stop)
    }
    pub fn from_reader(reader: impl Read + Send + 'static, stop: StopFlag) -> Self {
        let reader: Box<dyn Read + Send> = Box::new(reader);
        Self {
            reader: BufReader::new(reader),
            stop,
            buf: Vec::with_capacity(4096),
        }
    }
}
impl LineSource for SweepLines {
    fn next_line(&mut self) -> Result<Option<String>, SweepError> {
        if self.stop.is_stopped() {
            return Ok(None);
        }
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn drain(lines: &mut SweepLines) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().unwrap() {
            out.push(line);
        }
        out
    }
    #[test]
    fn reader_strips_line_endings() {
        let data: &[u8] = b"a, b\r\nc, d\nlast";
        let mut lines = SweepLines::from_reader(data, StopFlag::new());
        assert_eq!(drain(&mut lines), vec!["a, b", "c, d", "last"]);
        assert_eq!(lines.next_line().unwrap(), None);
    }
    #[test]
    fn reader_honours_stop_flag() {
        let stop = StopFlag::new();
        let data: &[u8] = b"one\ntwo\n";
        let mut lines = SweepLines::from_reader(data, stop.clone());
        assert_eq!(lines.next_line().unwrap().as_deref(), Some("one"));
        stop.request_stop();
        assert_eq!(lines.next_line().unwrap(), None);
    }
    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let data: &[u8] = b"\xff\xfe, x\n";
        let mut lines = SweepLines::from_reader(data, StopFlag::new());
        let line = lines.next_line().unwrap().unwrap();
        assert!(line.ends_with(", x"));
    }
    #[test]
    fn missing_shell_is_a_spawn_failure() {
        let cmd = ShellCommand::platform("hackrf_sweep").with_shell("/definitely/not/a/shell");
        let err = SweepProcess::start(&cmd, DEFAULT_GRACE).err().unwrap();
        assert!(matches!(err, SweepError::Spawn { ref command, .. } if command == "hackrf_sweep"));
    }
    #[cfg(unix)]
    #[test]
    fn streams_stdout_until_end_of_stream() {
        let cmd = ShellCommand::platform("printf 'first\\nsecond\\n'; echo oops 1>&2");
        let mut process = SweepProcess::start(&cmd, DEFAULT_GRACE).unwrap();
        let mut lines = process.lines().unwrap();
        assert!(process.lines().is_none());
        assert_eq!(drain(&mut lines), vec!["first", "second"]);
        // stdout closes a moment before the shell can be reaped
        thread::sleep(Duration::from_millis(100));
        let status = process.stop().unwrap();
        assert!(status.success());
        assert_eq!(process.stop().unwrap(), status);
    }
    #[cfg(unix)]
    #[test]
    fn stop_terminates_a_running_tool() {
        let cmd = ShellCommand::platform("echo ready; sleep 30");
        let mut process = SweepProcess::start(&cmd, Duration::from_secs(5)).unwrap();
        let mut lines = process.lines().unwrap();
        assert_eq!(lines.next_line().unwrap().as_deref(), Some("ready"));
        let started = Instant::now();
        let status = process.stop().unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(lines.next_line().unwrap(), None);
    }
    #[cfg(unix)]
    #[test]
    fn stop_reaches_children_the_shell_left_behind() {
        let cmd = ShellCommand::platform("sleep 30 & echo ready");
        let mut process = SweepProcess::start(&cmd, Duration::from_millis(200)).unwrap();
        let mut lines = process.lines().unwrap();
        assert_eq!(lines.next_line().unwrap().as_deref(), Some("ready"));
        // let the shell exit while `sleep` keeps stdout open
        thread::sleep(Duration::from_millis(100));
        let started = Instant::now();
        // returning at all means the stderr drain saw every writer go away
        process.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
    #[cfg(unix)]
    #[test]
    fn stubborn_tool_is_killed_after_grace() {
        let cmd = ShellCommand::platform("trap '' TERM; echo ready; while :; do sleep 1; done");
        let mut process = SweepProcess::start(&cmd, Duration::from_millis(200)).unwrap();
        let mut lines = process.lines().unwrap();
        assert_eq!(lines.next_line().unwrap().as_deref(), Some("ready"));
        let status = process.stop().unwrap();
        assert!(status.code().is_none());
    }
}
