//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Default FFmpeg program name, resolved through `PATH`.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    /// Arguments placed after -i
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Sample the input at a fixed number of frames per second.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.video_filter(format!("fps={}", fps))
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        // Overwrite existing frames, report only errors
        let mut args: Vec<String> = ["-y", "-v", "error"].iter().map(|s| s.to_string()).collect();

        // Progress goes to stderr alongside diagnostics
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and diagnostics capture.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: PathBuf,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a runner that invokes `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_FFMPEG),
            timeout_secs: None,
        }
    }

    /// Use a specific FFmpeg binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the process if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    ///
    /// On a non-zero exit the returned error carries every non-progress line
    /// FFmpeg wrote to stderr.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let program = check_ffmpeg(&self.program)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let stderr_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_line(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                        progress_callback(progress);
                    }
                } else {
                    output.push_str(&line);
                    output.push('\n');
                }
            }

            output
        });

        let result = self.wait_for_completion(&mut child).await;

        let output = stderr_handle.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(MediaError::ffmpeg_failed(
                format!("FFmpeg exited with status {}", status),
                output.trim_end(),
                status.code(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for child process with optional timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let Some(timeout_secs) = self.timeout_secs else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(timeout_secs))
            }
        }
    }
}

/// Resolve the FFmpeg binary, failing if it is not executable.
pub fn check_ffmpeg(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let program = program.as_ref();
    which::which(program).map_err(|_| MediaError::FfmpegNotFound(program.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("clip.mp4", "out/frame_%04d.png").frame_rate(1);

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert_eq!(&args[1..3], ["-v", "error"]);

        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input + 1], "clip.mp4");

        let filter = args.iter().position(|a| a == "-vf").unwrap();
        assert!(filter > input);
        assert_eq!(args[filter + 1], "fps=1");
        assert_eq!(args.last().unwrap(), "out/frame_%04d.png");
    }

    #[test]
    fn test_missing_program() {
        let err = check_ffmpeg("definitely-not-a-real-ffmpeg-binary").unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound(_)));
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_status() {
        let runner = FfmpegRunner::new().with_program("false");
        let cmd = FfmpegCommand::new("in.mp4", "out.png");

        match runner.run(&cmd).await {
            Err(MediaError::FfmpegFailed { exit_code, .. }) => assert_eq!(exit_code, Some(1)),
            other => panic!("expected FfmpegFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let runner = FfmpegRunner::new().with_program("true");
        let cmd = FfmpegCommand::new("in.mp4", "out.png");
        assert!(runner.run(&cmd).await.is_ok());
    }
}
