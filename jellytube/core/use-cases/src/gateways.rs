use ::async_trait::async_trait;
use ::domain::Channel;
use ::domain::Metadata;
use ::domain::Video;

use crate::models::descriptors::Descriptor;
use crate::utils::aliases::BoxedStream;
use crate::utils::aliases::Fallible;

#[async_trait]
pub trait VideoMetadataDownloader: ::core::marker::Send + ::core::marker::Sync {
    async fn download(self: ::std::sync::Arc<Self>, video: &Video) -> Fallible<()>;
}

#[async_trait]
pub trait ChannelMetadataDownloader: ::core::marker::Send + ::core::marker::Sync {
    async fn download(self: ::std::sync::Arc<Self>, channel: &Channel) -> Fallible<()>;
}

#[async_trait]
pub trait MetadataRepository: ::core::marker::Send + ::core::marker::Sync {
    async fn get(self: ::std::sync::Arc<Self>, path: &::std::path::Path) -> Fallible<Metadata>;
}

#[async_trait]
pub trait SidecarRepository: Insert<Descriptor> {
    /// Whether the sidecar is present; an unreadable location counts as absent.
    async fn exists(self: ::std::sync::Arc<Self>, path: &::std::path::Path) -> bool;
}

#[async_trait]
pub trait Insert<Resource>: ::core::marker::Send + ::core::marker::Sync {
    async fn insert(self: ::std::sync::Arc<Self>, resource: Resource) -> Fallible<()>;
}

#[async_trait]
pub trait LibraryRepository: ::core::marker::Send + ::core::marker::Sync {
    async fn exists(self: ::std::sync::Arc<Self>, root: &::std::path::Path) -> bool;

    async fn channels(self: ::std::sync::Arc<Self>, root: &::std::path::Path) -> Fallible<BoxedStream<Channel>>;

    async fn videos(self: ::std::sync::Arc<Self>, channel: &Channel) -> Fallible<BoxedStream<Video>>;
}

pub trait DescriptorRenderer: ::core::marker::Send + ::core::marker::Sync {
    fn render_video(&self, metadata: &Metadata) -> String;

    fn render_channel(&self, metadata: &Metadata) -> String;
}

#[async_trait]
pub trait ThumbnailConverter: ::core::marker::Send + ::core::marker::Sync {
    async fn convert(
        self: ::std::sync::Arc<Self>, source: &::std::path::Path, target: &::std::path::Path,
    ) -> Fallible<()>;
}
