pub(crate) mod utils;

use crate::utils::aliases::MaybeOwnedPath;
use crate::utils::aliases::MaybeOwnedString;

#[derive(Debug, Clone)]
pub struct Video {
    pub id: VideoId,
    pub path: MaybeOwnedPath,

    pub sidecars: VideoSidecars,
}

pub type VideoId = MaybeOwnedString;

impl Video {
    /// Locates a video by its file, the identifier being the file stem.
    pub fn locate<Path>(path: Path) -> Option<Self>
    where
        Path: Into<::std::path::PathBuf>,
    {
        let path: ::std::path::PathBuf = path.into();

        let id: VideoId = path.file_stem()?.to_str()?.to_owned().into();
        let directory = path.parent()?;
        let sidecars = VideoSidecars::locate(directory, &id);

        Some(Self { id, path: path.into(), sidecars })
    }
}

/// Files kept next to a video, all named after the video identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSidecars {
    pub metadata: MaybeOwnedPath,
    pub descriptor: MaybeOwnedPath,
    pub thumbnail: MaybeOwnedPath,
    pub converted_thumbnail: MaybeOwnedPath,
}

impl VideoSidecars {
    pub fn locate(directory: &::std::path::Path, id: &str) -> Self {
        Self {
            metadata: directory.join(format!("{id}.{METADATA_EXTENSION}")).into(),
            descriptor: directory.join(format!("{id}.{DESCRIPTOR_EXTENSION}")).into(),
            thumbnail: directory.join(format!("{id}.{THUMBNAIL_EXTENSION}")).into(),
            converted_thumbnail: directory.join(format!("{id}.{CONVERTED_THUMBNAIL_EXTENSION}")).into(),
        }
    }

    /// Output template handed to the downloader, extensions are appended by it.
    pub fn base(&self) -> ::std::path::PathBuf {
        strip_suffix(&self.metadata, METADATA_EXTENSION)
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub directory: MaybeOwnedPath,

    pub sidecars: ChannelSidecars,
}

pub type ChannelId = MaybeOwnedString;

impl Channel {
    /// Locates a channel by its directory, the identifier being the directory name.
    pub fn locate<Path>(directory: Path) -> Option<Self>
    where
        Path: Into<::std::path::PathBuf>,
    {
        let directory: ::std::path::PathBuf = directory.into();

        let id: ChannelId = directory.file_name()?.to_str()?.to_owned().into();
        let sidecars = ChannelSidecars::locate(&directory, &id);

        Some(Self { id, directory: directory.into(), sidecars })
    }
}

/// Channel-level files; the descriptor and converted thumbnail carry fixed names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSidecars {
    pub metadata: MaybeOwnedPath,
    pub descriptor: MaybeOwnedPath,
    pub thumbnail: MaybeOwnedPath,
    pub converted_thumbnail: MaybeOwnedPath,
}

impl ChannelSidecars {
    pub fn locate(directory: &::std::path::Path, id: &str) -> Self {
        Self {
            metadata: directory.join(format!("{id}.{METADATA_EXTENSION}")).into(),
            descriptor: directory.join(CHANNEL_DESCRIPTOR_FILENAME).into(),
            thumbnail: directory.join(format!("{id}.{THUMBNAIL_EXTENSION}")).into(),
            converted_thumbnail: directory.join(CHANNEL_CONVERTED_THUMBNAIL_FILENAME).into(),
        }
    }

    pub fn base(&self) -> ::std::path::PathBuf {
        strip_suffix(&self.metadata, METADATA_EXTENSION)
    }
}

/// Metadata record as written by the downloader. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub id: Option<MaybeOwnedString>,
    pub title: Option<MaybeOwnedString>,
    pub description: Option<MaybeOwnedString>,
    pub uploader: Option<MaybeOwnedString>,
    pub upload_date: Option<MaybeOwnedString>,
    pub channel: Option<MaybeOwnedString>,
    pub channel_id: Option<MaybeOwnedString>,
}

pub const METADATA_EXTENSION: &str = "info.json";
pub const DESCRIPTOR_EXTENSION: &str = "nfo";
pub const THUMBNAIL_EXTENSION: &str = "webp";
pub const CONVERTED_THUMBNAIL_EXTENSION: &str = "jpg";

pub const CHANNEL_DESCRIPTOR_FILENAME: &str = "tvshow.nfo";
pub const CHANNEL_CONVERTED_THUMBNAIL_FILENAME: &str = "folder.jpg";

fn strip_suffix(path: &::std::path::Path, extension: &str) -> ::std::path::PathBuf {
    let suffix = format!(".{extension}");

    match path.to_str().and_then(|path| path.strip_suffix(&suffix)) {
        Some(base) => base.into(),
        None => path.with_extension(""),
    }
}
