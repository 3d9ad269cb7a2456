use ::std::ffi::OsStr;

use ::anyhow::Context as _;
use ::async_trait::async_trait;
use ::domain::Channel;
use ::domain::Video;
use ::futures::prelude::*;
use ::use_cases::gateways::ChannelMetadataDownloader;
use ::use_cases::gateways::VideoMetadataDownloader;

use crate::utils::aliases::Fallible;
use crate::utils::aliases::MaybeOwnedString;
use crate::utils::extensions::OptionExt;

/// Fetches `.info.json` and thumbnail files without downloading any media.
#[derive(::bon::Builder)]
#[builder(on(MaybeOwnedString, into))]
pub struct YtdlpDownloader {
    #[builder(default = MaybeOwnedString::Borrowed(YTDLP))]
    program: MaybeOwnedString,

    executor: ::std::sync::Arc<dyn CommandExecutor>,
}

#[async_trait]
impl VideoMetadataDownloader for YtdlpDownloader {
    async fn download(self: ::std::sync::Arc<Self>, video: &Video) -> Fallible<()> {
        let url = format!("{VIDEO_URL_PREFIX}{}", video.id);
        let output = video.sidecars.base();

        #[rustfmt::skip]
        let args = [
            OsStr::new("--skip-download"),
            OsStr::new("--write-info-json"),
            OsStr::new("--write-thumbnail"),
            OsStr::new("--output"), output.as_os_str(),
            OsStr::new(&url),
        ];

        self.run(&args).await.with_context(|| format!("could not fetch metadata for video {}", video.id))
    }
}

#[async_trait]
impl ChannelMetadataDownloader for YtdlpDownloader {
    async fn download(self: ::std::sync::Arc<Self>, channel: &Channel) -> Fallible<()> {
        let url = format!("{CHANNEL_URL_PREFIX}{}", channel.id);
        let output = channel.sidecars.base();

        // Only the first upload is listed, the channel page itself carries the metadata.
        #[rustfmt::skip]
        let args = [
            OsStr::new("--skip-download"),
            OsStr::new("--write-info-json"),
            OsStr::new("--write-thumbnail"),
            OsStr::new("--playlist-end"), OsStr::new("1"),
            OsStr::new("--output"), output.as_os_str(),
            OsStr::new(&url),
        ];

        self.run(&args).await.with_context(|| format!("could not fetch metadata for channel {}", channel.id))
    }
}

impl YtdlpDownloader {
    async fn run(&self, args: &[&OsStr]) -> Fallible<()> {
        ::tracing::info!(program = %self.program, ?args, "invoking downloader");

        let output = ::std::sync::Arc::clone(&self.executor)
            .execute(OsStr::new(&*self.program), args)
            .await
            .with_context(|| format!("could not launch {}", self.program))?;

        let diagnostics = output.stderr.iter().filter_map(Diagnostic::from_line).collect::<Vec<_>>();

        for diagnostic in &diagnostics {
            match diagnostic.level {
                DiagnosticLevel::Warning => ::tracing::warn!(program = %self.program, "{}", diagnostic.message),
                DiagnosticLevel::Error => ::tracing::error!(program = %self.program, "{}", diagnostic.message),
            }
        }

        if output.status.success() {
            return Ok(());
        }

        let reason = diagnostics
            .iter()
            .rev()
            .find(|diagnostic| diagnostic.level == DiagnosticLevel::Error)
            .map(|diagnostic| diagnostic.message.as_str());

        match reason {
            Some(reason) => ::anyhow::bail!("{} exited with {}: {}", self.program, output.status, reason),
            None => ::anyhow::bail!("{} exited with {}", self.program, output.status),
        }
    }
}

#[async_trait]
pub trait CommandExecutor: ::core::marker::Send + ::core::marker::Sync {
    async fn execute(self: ::std::sync::Arc<Self>, program: &OsStr, args: &[&OsStr]) -> Fallible<CommandOutput>;
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: CommandStatus,
    pub stdout: Vec<MaybeOwnedString>,
    pub stderr: Vec<MaybeOwnedString>,
}

/// Exit code of a finished process, absent when it was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus(pub Option<i32>);

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.0 == Some(0)
    }
}

impl ::std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit status {code}"),
            None => write!(f, "no exit status"),
        }
    }
}

pub struct TokioCommandExecutor;

#[async_trait]
impl CommandExecutor for TokioCommandExecutor {
    async fn execute(self: ::std::sync::Arc<Self>, program: &OsStr, args: &[&OsStr]) -> Fallible<CommandOutput> {
        use ::tokio::io::AsyncBufReadExt as _;

        let mut process = ::tokio::process::Command::new(program)
            .args(args)
            .stdin(::std::process::Stdio::null())
            .stdout(::std::process::Stdio::piped())
            .stderr(::std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = process.stdout.take().ok()?;
        let stderr = process.stderr.take().ok()?;

        let (stdout, stderr, status) = ::tokio::try_join!(
            ::tokio_stream::wrappers::LinesStream::new(::tokio::io::BufReader::new(stdout).lines())
                .try_collect::<Vec<String>>(),
            ::tokio_stream::wrappers::LinesStream::new(::tokio::io::BufReader::new(stderr).lines())
                .try_collect::<Vec<String>>(),
            process.wait(),
        )?;

        let stdout = stdout.into_iter().map(MaybeOwnedString::from).collect();
        let stderr = stderr
            .into_iter()
            .inspect(|line| ::tracing::debug!("{line}"))
            .map(MaybeOwnedString::from)
            .collect();

        Ok(CommandOutput { status: CommandStatus(status.code()), stdout, stderr })
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Diagnostic {
    level: DiagnosticLevel,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiagnosticLevel {
    Warning,
    Error,
}

impl Diagnostic {
    fn from_line<Line>(line: Line) -> Option<Self>
    where
        Line: AsRef<str>,
    {
        let (level, message) = line.as_ref().split_once(':')?;

        let level = match level.trim() {
            "WARNING" => DiagnosticLevel::Warning,
            "ERROR" => DiagnosticLevel::Error,
            _ => return None,
        };

        Some(Self { level, message: message.trim().to_owned() })
    }
}

const YTDLP: &str = "yt-dlp";

const VIDEO_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
const CHANNEL_URL_PREFIX: &str = "https://www.youtube.com/channel/";

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingExecutor {
        status: Option<i32>,
        stderr: Vec<&'static str>,
        invocations: ::std::sync::Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn execute(self: ::std::sync::Arc<Self>, program: &OsStr, args: &[&OsStr]) -> Fallible<CommandOutput> {
            let invocation = ::std::iter::once(program)
                .chain(args.iter().copied())
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect();

            self.invocations.lock().unwrap().push(invocation);

            Ok(CommandOutput {
                status: CommandStatus(self.status),
                stdout: vec![],
                stderr: self.stderr.iter().map(|line| MaybeOwnedString::Borrowed(*line)).collect(),
            })
        }
    }

    fn downloader(executor: &::std::sync::Arc<RecordingExecutor>) -> ::std::sync::Arc<YtdlpDownloader> {
        let executor = ::std::sync::Arc::clone(executor) as ::std::sync::Arc<dyn CommandExecutor>;
        ::std::sync::Arc::new(YtdlpDownloader::builder().executor(executor).build())
    }

    #[tokio::test]
    async fn video_request_targets_the_watch_url() {
        let executor = ::std::sync::Arc::new(RecordingExecutor { status: Some(0), ..Default::default() });
        let video = Video::locate("/media/UCabc/abc123.mp4").unwrap();

        VideoMetadataDownloader::download(downloader(&executor), &video).await.unwrap();

        let invocations = executor.invocations.lock().unwrap();
        assert_eq!(invocations[..], [vec![
            "yt-dlp",
            "--skip-download",
            "--write-info-json",
            "--write-thumbnail",
            "--output",
            "/media/UCabc/abc123",
            "https://www.youtube.com/watch?v=abc123",
        ]]);
    }

    #[tokio::test]
    async fn channel_request_is_bounded_to_one_item() {
        let executor = ::std::sync::Arc::new(RecordingExecutor { status: Some(0), ..Default::default() });
        let channel = Channel::locate("/media/UCabc").unwrap();

        ChannelMetadataDownloader::download(downloader(&executor), &channel).await.unwrap();

        let invocations = executor.invocations.lock().unwrap();
        assert_eq!(invocations[..], [vec![
            "yt-dlp",
            "--skip-download",
            "--write-info-json",
            "--write-thumbnail",
            "--playlist-end",
            "1",
            "--output",
            "/media/UCabc/UCabc",
            "https://www.youtube.com/channel/UCabc",
        ]]);
    }

    #[tokio::test]
    async fn non_zero_exit_carries_the_last_error_line() {
        let executor = ::std::sync::Arc::new(RecordingExecutor {
            status: Some(1),
            stderr: vec![
                "WARNING: [youtube] Falling back to generic n function search",
                "ERROR: [youtube] abc123: Video unavailable",
            ],
            ..Default::default()
        });
        let video = Video::locate("/media/UCabc/abc123.mp4").unwrap();

        let err = VideoMetadataDownloader::download(downloader(&executor), &video).await.unwrap_err();
        let message = format!("{err:#}");

        assert!(message.contains("video abc123"), "{message}");
        assert!(message.contains("exit status 1: [youtube] abc123: Video unavailable"), "{message}");
    }

    #[tokio::test]
    async fn signal_termination_is_a_failure() {
        let executor = ::std::sync::Arc::new(RecordingExecutor { status: None, ..Default::default() });
        let channel = Channel::locate("/media/UCabc").unwrap();

        let err = ChannelMetadataDownloader::download(downloader(&executor), &channel).await.unwrap_err();

        assert!(format!("{err:#}").contains("yt-dlp exited with no exit status"));
    }

    #[tokio::test]
    async fn missing_program_cannot_be_launched() {
        let executor = ::std::sync::Arc::new(TokioCommandExecutor) as ::std::sync::Arc<dyn CommandExecutor>;
        let downloader = ::std::sync::Arc::new(
            YtdlpDownloader::builder()
                .program("jellytube-no-such-program")
                .executor(executor)
                .build(),
        );
        let video = Video::locate("/media/UCabc/abc123.mp4").unwrap();

        let err = VideoMetadataDownloader::download(downloader, &video).await.unwrap_err();

        assert!(format!("{err:#}").contains("could not launch jellytube-no-such-program"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn real_process_output_is_captured() {
        let executor = ::std::sync::Arc::new(TokioCommandExecutor);
        let args = [OsStr::new("-c"), OsStr::new("echo listed; echo 'ERROR: [youtube] x: gone' >&2; exit 3")];

        let output = executor.execute(OsStr::new("sh"), &args).await.unwrap();

        assert_eq!(output.status, CommandStatus(Some(3)));
        assert!(!output.status.success());
        assert_eq!(output.stdout, ["listed"]);
        assert_eq!(output.stderr, ["ERROR: [youtube] x: gone"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_process_surfaces_its_error_line() {
        let executor = ::std::sync::Arc::new(TokioCommandExecutor) as ::std::sync::Arc<dyn CommandExecutor>;
        let downloader = ::std::sync::Arc::new(
            YtdlpDownloader::builder()
                .program("sh")
                .executor(executor)
                .build(),
        );

        // `sh` rejects the downloader options and exits non-zero.
        let video = Video::locate("/media/UCabc/abc123.mp4").unwrap();
        let err = VideoMetadataDownloader::download(downloader, &video).await.unwrap_err();

        assert!(format!("{err:#}").contains("sh exited with exit status"), "{err:#}");
    }

    #[test]
    fn diagnostics_are_recognized_by_level() {
        assert_eq!(
            Diagnostic::from_line("WARNING: unable to download thumbnail"),
            Some(Diagnostic { level: DiagnosticLevel::Warning, message: "unable to download thumbnail".to_owned() }),
        );
        assert_eq!(
            Diagnostic::from_line("ERROR: [youtube] x: Private video"),
            Some(Diagnostic { level: DiagnosticLevel::Error, message: "[youtube] x: Private video".to_owned() }),
        );
        assert_eq!(Diagnostic::from_line("[info] Writing video metadata as JSON"), None);
        assert_eq!(Diagnostic::from_line("no separator"), None);
    }
}
