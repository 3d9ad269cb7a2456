use ::anyhow::Context as _;
use ::async_trait::async_trait;
use ::domain::Channel;
use ::domain::Metadata;
use ::domain::Video;
use ::futures::prelude::*;
use ::use_cases::gateways::Insert;
use ::use_cases::gateways::LibraryRepository;
use ::use_cases::gateways::MetadataRepository;
use ::use_cases::gateways::SidecarRepository;
use ::use_cases::models::descriptors::Descriptor;

use crate::utils::aliases::BoxedStream;
use crate::utils::aliases::Fallible;
use crate::utils::aliases::MaybeOwnedString;

/// Reads the media library layout: channel directories under a root, video files under each channel.
#[derive(::bon::Builder)]
pub struct FilesystemLibraryRepository {
    #[builder(default = vec![MaybeOwnedString::Borrowed(DEFAULT_VIDEO_EXTENSION)])]
    video_extensions: Vec<MaybeOwnedString>,
}

#[async_trait]
impl LibraryRepository for FilesystemLibraryRepository {
    async fn exists(self: ::std::sync::Arc<Self>, root: &::std::path::Path) -> bool {
        ::tokio::fs::metadata(root).await.is_ok_and(|metadata| metadata.is_dir())
    }

    async fn channels(self: ::std::sync::Arc<Self>, root: &::std::path::Path) -> Fallible<BoxedStream<Channel>> {
        let directories = entries(root, |metadata| metadata.is_dir())
            .await
            .with_context(|| format!("could not list channels in {}", root.display()))?;

        let channels = directories.into_iter().filter_map(Channel::locate).collect::<Vec<_>>();

        Ok(::std::boxed::Box::pin(stream::iter(channels)))
    }

    async fn videos(self: ::std::sync::Arc<Self>, channel: &Channel) -> Fallible<BoxedStream<Video>> {
        let files = entries(&channel.directory, |metadata| metadata.is_file())
            .await
            .with_context(|| format!("could not list videos of channel {}", channel.id))?;

        let videos = files
            .into_iter()
            .filter(|path| self.is_video(path))
            .filter_map(Video::locate)
            .collect::<Vec<_>>();

        Ok(::std::boxed::Box::pin(stream::iter(videos)))
    }
}

impl FilesystemLibraryRepository {
    fn is_video(&self, path: &::std::path::Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| self.video_extensions.iter().any(|video| video == extension))
    }
}

/// Entries of a directory matching `keep`, sorted by name. Symlinks are followed.
async fn entries<Keep>(directory: &::std::path::Path, keep: Keep) -> Fallible<Vec<::std::path::PathBuf>>
where
    Keep: Fn(&::std::fs::Metadata) -> bool,
{
    let reader = ::tokio::fs::read_dir(directory).await?;
    let keep = &keep;

    let mut entries = ::tokio_stream::wrappers::ReadDirStream::new(reader)
        .try_filter_map(|entry| async move {
            let path = entry.path();

            match ::tokio::fs::metadata(&path).await {
                Ok(metadata) if keep(&metadata) => Ok::<_, ::std::io::Error>(Some(path)),
                Ok(_) => Ok(None),
                Err(err) => {
                    ::tracing::debug!(path = %path.display(), "skipping unreadable entry: {err}");
                    Ok(None)
                },
            }
        })
        .try_collect::<Vec<_>>()
        .await?;

    entries.sort_by(|left, right| left.file_name().cmp(&right.file_name()));

    Ok(entries)
}

/// Sidecar files stored next to the media they describe.
pub struct FilesystemSidecarRepository;

#[async_trait]
impl SidecarRepository for FilesystemSidecarRepository {
    async fn exists(self: ::std::sync::Arc<Self>, path: &::std::path::Path) -> bool {
        ::tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[async_trait]
impl Insert<Descriptor> for FilesystemSidecarRepository {
    async fn insert(self: ::std::sync::Arc<Self>, descriptor: Descriptor) -> Fallible<()> {
        let file = ::tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&descriptor.path)
            .await
            .with_context(|| format!("could not create {}", descriptor.path.display()))?;

        write_or_discard(file, &descriptor.path, descriptor.contents.as_bytes()).await?;

        ::tracing::debug!(path = %descriptor.path.display(), "descriptor written");

        Ok(())
    }
}

/// A partially written sidecar would pass every later gating check, so it is removed on failure.
async fn write_or_discard<Writer>(mut writer: Writer, path: &::std::path::Path, contents: &[u8]) -> Fallible<()>
where
    Writer: ::tokio::io::AsyncWrite + ::core::marker::Unpin,
{
    use ::tokio::io::AsyncWriteExt as _;

    let written = async {
        writer.write_all(contents).await?;
        writer.flush().await
    }
    .await;

    if let Err(err) = written {
        drop(writer);

        if let Err(err) = ::tokio::fs::remove_file(path).await {
            ::tracing::warn!(path = %path.display(), "partial descriptor not removed: {err}");
        }

        return Err(err).with_context(|| format!("could not write {}", path.display()));
    }

    Ok(())
}

/// Metadata documents written by the downloader as JSON objects.
pub struct JsonMetadataRepository;

#[async_trait]
impl MetadataRepository for JsonMetadataRepository {
    async fn get(self: ::std::sync::Arc<Self>, path: &::std::path::Path) -> Fallible<Metadata> {
        let contents = ::tokio::fs::read(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;

        let document: ::serde_json::Map<String, ::serde_json::Value> = ::serde_json::from_slice(&contents)
            .with_context(|| format!("{} is not a JSON object", path.display()))?;

        let record = <MetadataRecord as ::serde::Deserialize>::deserialize(::serde_json::Value::Object(document))?;

        Ok(record.into())
    }
}

#[derive(Debug, Default, ::serde::Deserialize)]
#[serde(default)]
struct MetadataRecord {
    #[serde(deserialize_with = "string_or_absent")]
    id: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    title: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    description: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    uploader: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    upload_date: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    channel: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    channel_id: Option<String>,
}

impl From<MetadataRecord> for Metadata {
    fn from(record: MetadataRecord) -> Self {
        Self {
            id: record.id.map(Into::into),
            title: record.title.map(Into::into),
            description: record.description.map(Into::into),
            uploader: record.uploader.map(Into::into),
            upload_date: record.upload_date.map(Into::into),
            channel: record.channel.map(Into::into),
            channel_id: record.channel_id.map(Into::into),
        }
    }
}

// Numbers, nulls and nested values are not text.
fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: ::serde::Deserializer<'de>,
{
    match <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)? {
        ::serde_json::Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

const DEFAULT_VIDEO_EXTENSION: &str = "mp4";
