use ::async_trait::async_trait;
use ::use_cases::boundaries::Activate;
use ::use_cases::boundaries::Update;
use ::use_cases::models::events::ArtifactEvent;
use ::use_cases::models::events::ArtifactKind;
use ::use_cases::models::events::ArtifactOutcome;
use ::use_cases::models::events::ArtifactOwner;
use ::use_cases::models::events::ChannelStartedEvent;
use ::use_cases::models::events::LibraryCompletedEvent;
use ::use_cases::models::events::LibraryStartedEvent;

use crate::utils::aliases::Fallible;

macro_rules! lazy_progress_style {
    ($template:expr) => {
        ::once_cell::sync::Lazy::new(|| {
            ::indicatif::ProgressStyle::with_template($template).unwrap_or_else(|_| ::indicatif::ProgressStyle::default_bar())
        })
    };
}

macro_rules! lazy_color {
    ($color:expr) => {
        ::once_cell::sync::Lazy::new(|| {
            use ::colored::Colorize as _;

            $color
        })
    };
}

/// Terminal view of a library run: one progress bar over the channels, one line per artifact outcome.
pub struct LibraryView {
    progress_bars: ::indicatif::MultiProgress,
    channel_progress_bar: ::indicatif::ProgressBar,
    failures: ::std::sync::atomic::AtomicUsize,
}

impl LibraryView {
    pub fn new() -> Self {
        static PROGRESS_BAR_STYLE: ::once_cell::sync::Lazy<::indicatif::ProgressStyle> =
            lazy_progress_style!("{prefix} {bar:50} {pos}/{len} {msg}");

        let progress_bars = ::indicatif::MultiProgress::new();
        progress_bars.set_draw_target(::indicatif::ProgressDrawTarget::hidden());

        let channel_progress_bar =
            progress_bars.add(::indicatif::ProgressBar::new(0).with_style(PROGRESS_BAR_STYLE.clone()));

        channel_progress_bar.set_prefix("Channels");

        Self { progress_bars, channel_progress_bar, failures: ::std::sync::atomic::AtomicUsize::new(0) }
    }

    /// Number of artifacts that could not be created so far.
    pub fn failures(&self) -> usize {
        self.failures.load(::std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for LibraryView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Activate for LibraryView {
    async fn activate(self: ::std::sync::Arc<Self>) -> Fallible<()> {
        self.progress_bars.set_draw_target(::indicatif::ProgressDrawTarget::stderr());
        self.channel_progress_bar.tick();

        Ok(())
    }

    async fn deactivate(self: ::std::sync::Arc<Self>) -> Fallible<()> {
        self.progress_bars.set_draw_target(::indicatif::ProgressDrawTarget::hidden());

        Ok(())
    }
}

#[async_trait]
impl Update<LibraryStartedEvent> for LibraryView {
    async fn update(self: ::std::sync::Arc<Self>, event: &LibraryStartedEvent) -> Fallible<()> {
        use ::colored::Colorize as _;

        let LibraryStartedEvent { root, channels } = event;

        self.channel_progress_bar.set_length(*channels as u64);
        self.channel_progress_bar
            .println(format!("Scanning {}", root.display().to_string().white().bold()));

        Ok(())
    }
}

#[async_trait]
impl Update<ChannelStartedEvent> for LibraryView {
    async fn update(self: ::std::sync::Arc<Self>, event: &ChannelStartedEvent) -> Fallible<()> {
        use ::colored::Colorize as _;

        let ChannelStartedEvent { channel } = event;

        self.channel_progress_bar.inc(1);
        self.channel_progress_bar.set_message(channel.to_string().white().bold().to_string());

        Ok(())
    }
}

#[async_trait]
impl Update<ArtifactEvent> for LibraryView {
    async fn update(self: ::std::sync::Arc<Self>, event: &ArtifactEvent) -> Fallible<()> {
        use ::colored::Colorize as _;

        static CREATED: ::once_cell::sync::Lazy<::colored::ColoredString> = lazy_color!("created".green());
        static FAILED: ::once_cell::sync::Lazy<::colored::ColoredString> = lazy_color!("failed".red().bold());

        let ArtifactEvent { owner, kind, outcome } = event;

        let owner = match owner {
            ArtifactOwner::Video(id) => format!("video {id}"),
            ArtifactOwner::Channel(id) => format!("channel {id}"),
        };

        let kind = match kind {
            ArtifactKind::Metadata => "metadata",
            ArtifactKind::Descriptor => "descriptor",
            ArtifactKind::Thumbnail => "thumbnail",
        };

        match outcome {
            ArtifactOutcome::Started => {},

            ArtifactOutcome::Created => {
                self.channel_progress_bar.println(format!("{} {kind} for {owner}", *CREATED));
            },

            ArtifactOutcome::Failed(reason) => {
                self.failures.fetch_add(1, ::std::sync::atomic::Ordering::Relaxed);
                self.channel_progress_bar
                    .println(format!("{} {kind} for {owner}: {}", *FAILED, reason.red()));
            },
        }

        Ok(())
    }
}

#[async_trait]
impl Update<LibraryCompletedEvent> for LibraryView {
    async fn update(self: ::std::sync::Arc<Self>, event: &LibraryCompletedEvent) -> Fallible<()> {
        use ::colored::Colorize as _;

        static PROGRESS_BAR_FINISH_STYLE: ::once_cell::sync::Lazy<::indicatif::ProgressStyle> =
            lazy_progress_style!("{prefix} {bar:50.green} {pos}/{len} {msg}");

        let LibraryCompletedEvent { channels, videos, conversions } = event;
        let failures = self.failures();

        let summary = format!(
            "{channels} channels, {videos} videos, {conversions} conversions, {failures} failures"
        );

        let summary = match failures {
            0 => summary.green(),
            _ => summary.yellow(),
        };

        self.channel_progress_bar.set_style(PROGRESS_BAR_FINISH_STYLE.clone());
        self.channel_progress_bar.finish_with_message(summary.to_string());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(owner: ArtifactOwner) -> ArtifactEvent {
        ArtifactEvent { owner, kind: ArtifactKind::Metadata, outcome: ArtifactOutcome::Failed("offline".into()) }
    }

    #[tokio::test]
    async fn failures_are_tallied() {
        let view = ::std::sync::Arc::new(LibraryView::new());

        let started = LibraryStartedEvent { root: ::std::path::Path::new("/media").to_owned().into(), channels: 2 };
        ::std::sync::Arc::clone(&view).update(&started).await.unwrap();
        ::std::sync::Arc::clone(&view).update(&ChannelStartedEvent { channel: "UCabc".into() }).await.unwrap();

        let created = ArtifactEvent {
            owner: ArtifactOwner::Video("abc123".into()),
            kind: ArtifactKind::Descriptor,
            outcome: ArtifactOutcome::Created,
        };
        ::std::sync::Arc::clone(&view).update(&created).await.unwrap();
        ::std::sync::Arc::clone(&view).update(&failed(ArtifactOwner::Channel("UCabc".into()))).await.unwrap();
        ::std::sync::Arc::clone(&view).update(&failed(ArtifactOwner::Video("abc123".into()))).await.unwrap();

        assert_eq!(view.failures(), 2);
        assert_eq!(view.channel_progress_bar.position(), 1);

        let completed = LibraryCompletedEvent { channels: 1, videos: 1, conversions: 0 };
        ::std::sync::Arc::clone(&view).update(&completed).await.unwrap();

        assert_eq!(view.failures(), 2);
        assert!(view.channel_progress_bar.is_finished());
        assert_eq!(view.channel_progress_bar.position(), view.channel_progress_bar.length().unwrap_or_default());
    }
}
