pub mod events {
    use ::domain::ChannelId;
    use ::domain::VideoId;

    use crate::utils::aliases::MaybeOwnedPath;
    use crate::utils::aliases::MaybeOwnedString;

    #[derive(Debug, Clone)]
    pub struct LibraryStartedEvent {
        pub root: MaybeOwnedPath,
        pub channels: usize,
    }

    #[derive(Debug, Clone)]
    pub struct LibraryCompletedEvent {
        pub channels: usize,
        pub videos: usize,
        pub conversions: usize,
    }

    #[derive(Debug, Clone)]
    pub struct ChannelStartedEvent {
        pub channel: ChannelId,
    }

    /// Progress of a single sidecar artifact of a video or a channel.
    #[derive(Debug, Clone)]
    pub struct ArtifactEvent {
        pub owner: ArtifactOwner,
        pub kind: ArtifactKind,
        pub outcome: ArtifactOutcome,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ArtifactOwner {
        Video(VideoId),
        Channel(ChannelId),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ArtifactKind {
        Metadata,
        Descriptor,
        Thumbnail,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ArtifactOutcome {
        Started,
        Created,
        Failed(MaybeOwnedString),
    }
}

pub mod descriptors {
    use crate::utils::aliases::MaybeOwnedPath;
    use crate::utils::aliases::MaybeOwnedString;

    /// Rendered XML sidecar waiting to be written.
    #[derive(Debug, Clone)]
    pub struct Descriptor {
        pub path: MaybeOwnedPath,
        pub contents: MaybeOwnedString,
    }
}
