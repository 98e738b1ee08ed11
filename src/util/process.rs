//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    stdin: Option<Vec<u8>>,
}

/// Which pipe a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line captured from a running child process, without its line ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }

    /// Create a process builder from an argument vector (`argv[0]` is the program).
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(ProcessBuilder::new(program).args(args))
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Set stdin data.
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();

        cmd.stdin(if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        if let Some(ref stdin_data) = self.stdin {
            use std::io::Write;
            if let Some(mut stdin) = child.stdin.take() {
                // The child may exit without reading its input.
                if let Err(e) = stdin.write_all(stdin_data) {
                    if e.kind() != io::ErrorKind::BrokenPipe {
                        return Err(e).with_context(|| {
                            format!("failed to write stdin of `{}`", self.program.display())
                        });
                    }
                }
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        Ok(output)
    }

    /// Execute the command, delivering every stdout and stderr line to `on_line`.
    ///
    /// Each pipe is drained by its own reader thread; both feed one channel
    /// that is consumed on the calling thread, so `on_line` never runs
    /// concurrently with itself. Line order is preserved within a stream but
    /// not across streams. Returns once both pipes are closed and the child
    /// has exited.
    pub fn exec_streaming<F>(&self, mut on_line: F) -> io::Result<ExitStatus>
    where
        F: FnMut(OutputLine),
    {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, OutputStream::Stderr, tx.clone()));
        }
        // Only the readers hold senders now; the loop ends when both hit EOF.
        drop(tx);

        for line in rx {
            on_line(line);
        }

        for reader in readers {
            if let Ok(Err(e)) = reader.join() {
                tracing::debug!("error reading output of `{}`: {}", self.display_command(), e);
            }
        }

        child.wait()
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn spawn_line_reader<R>(
    pipe: R,
    stream: OutputStream,
    tx: mpsc::Sender<OutputLine>,
) -> thread::JoinHandle<io::Result<()>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            let line = OutputLine {
                stream,
                text: decode_line(&buf),
            };
            // A gone consumer still leaves the pipe drained so the child never blocks.
            let _ = tx.send(line);
        }
    })
}

/// Strip the line terminator and decode lossily.
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Find an executable in PATH, or resolve an explicit path.
pub fn find_executable(name: impl AsRef<OsStr>) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find a C compiler.
pub fn find_c_compiler() -> Option<PathBuf> {
    // Check CC environment variable first
    if let Ok(cc) = std::env::var("CC") {
        if let Some(path) = find_executable(&cc) {
            return Some(path);
        }
    }

    for compiler in &["cc", "gcc", "clang"] {
        if let Some(path) = find_executable(compiler) {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_builder() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.trim() == "hello" || stdout.contains("hello"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cppcheck").args(["--enable=all", "-q", "src"]);

        assert_eq!(pb.display_command(), "cppcheck --enable=all -q src");
    }

    #[test]
    fn test_from_argv() {
        let argv = vec!["tool".to_string(), "-a".to_string()];
        let pb = ProcessBuilder::from_argv(&argv).unwrap();
        assert_eq!(pb.get_program(), Path::new("tool"));
        assert_eq!(pb.get_args(), &["-a".to_string()]);

        assert!(ProcessBuilder::from_argv(&[]).is_none());
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"abc\n"), "abc");
        assert_eq!(decode_line(b"abc\r\n"), "abc");
        assert_eq!(decode_line(b"partial"), "partial");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_streaming_both_pipes() {
        let script = "echo out1; echo err1 >&2; echo out2; printf 'tail'";
        let mut lines = Vec::new();
        let status = ProcessBuilder::new("sh")
            .args(["-c", script])
            .exec_streaming(|line| lines.push(line))
            .unwrap();

        assert!(status.success());
        assert_eq!(lines.len(), 4);

        let stdout: Vec<_> = lines
            .iter()
            .filter(|l| l.stream == OutputStream::Stdout)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stdout, vec!["out1", "out2", "tail"]);

        let stderr: Vec<_> = lines
            .iter()
            .filter(|l| l.stream == OutputStream::Stderr)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stderr, vec!["err1"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_streaming_nonzero_exit() {
        let status = ProcessBuilder::new("sh")
            .args(["-c", "exit 3"])
            .exec_streaming(|_| {})
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_exec_streaming_missing_program() {
        let result = ProcessBuilder::new("definitely-not-a-real-analyzer-binary")
            .exec_streaming(|_| {});
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_with_stdin() {
        let output = ProcessBuilder::new("cat").stdin("piped").exec().unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "piped");
    }
}
