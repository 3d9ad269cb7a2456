use ::async_trait::async_trait;
use ::domain::Channel;
use ::domain::Video;
use ::futures::prelude::*;

use crate::boundaries::Accept;
use crate::boundaries::ProcessChannelOutputBoundary;
use crate::boundaries::ProcessChannelRequestModel;
use crate::boundaries::ProcessLibraryOutputBoundary;
use crate::boundaries::ProcessLibraryRequestModel;
use crate::boundaries::ProcessVideoOutputBoundary;
use crate::boundaries::ProcessVideoRequestModel;
use crate::boundaries::Update;
use crate::gateways::ChannelMetadataDownloader;
use crate::gateways::DescriptorRenderer;
use crate::gateways::LibraryRepository;
use crate::gateways::MetadataRepository;
use crate::gateways::SidecarRepository;
use crate::gateways::ThumbnailConverter;
use crate::gateways::VideoMetadataDownloader;
use crate::models::descriptors::Descriptor;
use crate::models::events::ArtifactEvent;
use crate::models::events::ArtifactKind;
use crate::models::events::ArtifactOutcome;
use crate::models::events::ArtifactOwner;
use crate::models::events::ChannelStartedEvent;
use crate::models::events::LibraryCompletedEvent;
use crate::models::events::LibraryStartedEvent;
use crate::utils::aliases::Fallible;
use crate::utils::aliases::MaybeOwnedPath;

#[derive(::bon::Builder)]
pub struct ProcessVideoInteractor {
    pub output_boundary: ::std::sync::Arc<dyn ProcessVideoOutputBoundary>,

    pub downloader: ::std::sync::Arc<dyn VideoMetadataDownloader>,
    pub metadata: ::std::sync::Arc<dyn MetadataRepository>,
    pub sidecars: ::std::sync::Arc<dyn SidecarRepository>,
    pub renderer: ::std::sync::Arc<dyn DescriptorRenderer>,
    pub converter: ::std::sync::Arc<dyn ThumbnailConverter>,
    pub conversions: ::std::sync::Arc<PendingConversions>,
}

#[async_trait]
impl Accept<ProcessVideoRequestModel> for ProcessVideoInteractor {
    async fn accept(self: ::std::sync::Arc<Self>, request: ProcessVideoRequestModel) -> Fallible<()> {
        let ProcessVideoRequestModel { video } = request;
        let owner = ArtifactOwner::Video(video.id.clone());

        if !::std::sync::Arc::clone(&self.sidecars).exists(&video.sidecars.metadata).await {
            self.report(&owner, ArtifactKind::Metadata, ArtifactOutcome::Started).await?;

            match ::std::sync::Arc::clone(&self.downloader).download(&video).await {
                Ok(()) => self.report(&owner, ArtifactKind::Metadata, ArtifactOutcome::Created).await?,
                Err(err) => {
                    ::tracing::warn!(video = %video.id, "metadata download failed: {err:#}");

                    // Dependent sidecars wait for the next run, the metadata file is still missing then.
                    return self.report(&owner, ArtifactKind::Metadata, failed(&err)).await;
                },
            }
        }

        if ::std::sync::Arc::clone(&self.sidecars).exists(&video.sidecars.descriptor).await {
            ::tracing::debug!(video = %video.id, "descriptor already present");
        } else {
            let outcome = match ::std::sync::Arc::clone(&self).describe(&video).await {
                Ok(()) => ArtifactOutcome::Created,
                Err(err) => {
                    ::tracing::warn!(video = %video.id, "descriptor not written: {err:#}");
                    failed(&err)
                },
            };

            self.report(&owner, ArtifactKind::Descriptor, outcome).await?;
        }

        if ::std::sync::Arc::clone(&self.sidecars).exists(&video.sidecars.thumbnail).await
            && !::std::sync::Arc::clone(&self.sidecars).exists(&video.sidecars.converted_thumbnail).await
        {
            let source = video.sidecars.thumbnail.clone();
            let target = video.sidecars.converted_thumbnail.clone();

            let converter = ::std::sync::Arc::clone(&self.converter);
            let output_boundary = ::std::sync::Arc::clone(&self.output_boundary);

            self.conversions.launch(converter, output_boundary, owner, source, target).await;
        }

        Ok(())
    }
}

impl ProcessVideoInteractor {
    async fn describe(self: ::std::sync::Arc<Self>, video: &Video) -> Fallible<()> {
        let metadata = ::std::sync::Arc::clone(&self.metadata).get(&video.sidecars.metadata).await?;

        let descriptor = Descriptor {
            path: video.sidecars.descriptor.clone(),
            contents: self.renderer.render_video(&metadata).into(),
        };

        ::std::sync::Arc::clone(&self.sidecars).insert(descriptor).await
    }

    async fn report(&self, owner: &ArtifactOwner, kind: ArtifactKind, outcome: ArtifactOutcome) -> Fallible<()> {
        report(&self.output_boundary, owner, kind, outcome).await
    }
}

#[derive(::bon::Builder)]
pub struct ProcessChannelInteractor {
    pub output_boundary: ::std::sync::Arc<dyn ProcessChannelOutputBoundary>,

    pub downloader: ::std::sync::Arc<dyn ChannelMetadataDownloader>,
    pub metadata: ::std::sync::Arc<dyn MetadataRepository>,
    pub sidecars: ::std::sync::Arc<dyn SidecarRepository>,
    pub renderer: ::std::sync::Arc<dyn DescriptorRenderer>,
    pub converter: ::std::sync::Arc<dyn ThumbnailConverter>,
    pub conversions: ::std::sync::Arc<PendingConversions>,
}

#[async_trait]
impl Accept<ProcessChannelRequestModel> for ProcessChannelInteractor {
    async fn accept(self: ::std::sync::Arc<Self>, request: ProcessChannelRequestModel) -> Fallible<()> {
        let ProcessChannelRequestModel { channel } = request;
        let owner = ArtifactOwner::Channel(channel.id.clone());

        let event = ChannelStartedEvent { channel: channel.id.clone() };
        Update::<ChannelStartedEvent>::update(::std::sync::Arc::clone(&self.output_boundary), &event).await?;

        if !::std::sync::Arc::clone(&self.sidecars).exists(&channel.sidecars.metadata).await {
            self.report(&owner, ArtifactKind::Metadata, ArtifactOutcome::Started).await?;

            // Videos of the channel are processed regardless of the outcome.
            let outcome = match ::std::sync::Arc::clone(&self.downloader).download(&channel).await {
                Ok(()) => ArtifactOutcome::Created,
                Err(err) => {
                    ::tracing::warn!(channel = %channel.id, "metadata download failed: {err:#}");
                    failed(&err)
                },
            };

            self.report(&owner, ArtifactKind::Metadata, outcome).await?;
        }

        if ::std::sync::Arc::clone(&self.sidecars).exists(&channel.sidecars.metadata).await
            && !::std::sync::Arc::clone(&self.sidecars).exists(&channel.sidecars.descriptor).await
        {
            let outcome = match ::std::sync::Arc::clone(&self).describe(&channel).await {
                Ok(()) => ArtifactOutcome::Created,
                Err(err) => {
                    ::tracing::warn!(channel = %channel.id, "descriptor not written: {err:#}");
                    failed(&err)
                },
            };

            self.report(&owner, ArtifactKind::Descriptor, outcome).await?;
        }

        if ::std::sync::Arc::clone(&self.sidecars).exists(&channel.sidecars.thumbnail).await
            && !::std::sync::Arc::clone(&self.sidecars).exists(&channel.sidecars.converted_thumbnail).await
        {
            let source = channel.sidecars.thumbnail.clone();
            let target = channel.sidecars.converted_thumbnail.clone();

            let converter = ::std::sync::Arc::clone(&self.converter);
            let output_boundary = ::std::sync::Arc::clone(&self.output_boundary);

            self.conversions.launch(converter, output_boundary, owner, source, target).await;
        }

        Ok(())
    }
}

impl ProcessChannelInteractor {
    async fn describe(self: ::std::sync::Arc<Self>, channel: &Channel) -> Fallible<()> {
        let metadata = ::std::sync::Arc::clone(&self.metadata).get(&channel.sidecars.metadata).await?;

        let descriptor = Descriptor {
            path: channel.sidecars.descriptor.clone(),
            contents: self.renderer.render_channel(&metadata).into(),
        };

        ::std::sync::Arc::clone(&self.sidecars).insert(descriptor).await
    }

    async fn report(&self, owner: &ArtifactOwner, kind: ArtifactKind, outcome: ArtifactOutcome) -> Fallible<()> {
        report(&self.output_boundary, owner, kind, outcome).await
    }
}

#[derive(::bon::Builder)]
pub struct ProcessLibraryInteractor {
    pub output_boundary: ::std::sync::Arc<dyn ProcessLibraryOutputBoundary>,

    pub library: ::std::sync::Arc<dyn LibraryRepository>,
    pub channel_processor: ::std::sync::Arc<dyn Accept<ProcessChannelRequestModel>>,
    pub video_processor: ::std::sync::Arc<dyn Accept<ProcessVideoRequestModel>>,
    pub conversions: ::std::sync::Arc<PendingConversions>,
}

#[async_trait]
impl Accept<ProcessLibraryRequestModel> for ProcessLibraryInteractor {
    async fn accept(self: ::std::sync::Arc<Self>, request: ProcessLibraryRequestModel) -> Fallible<()> {
        let ProcessLibraryRequestModel { root } = request;

        if !::std::sync::Arc::clone(&self.library).exists(&root).await {
            ::anyhow::bail!("the media root {} does not exist", root.display());
        }

        let channels: Vec<Channel> = ::std::sync::Arc::clone(&self.library).channels(&root).await?.collect().await;

        ::std::sync::Arc::clone(&self.output_boundary).activate().await?;

        let event = LibraryStartedEvent { root: root.clone(), channels: channels.len() };
        Update::<LibraryStartedEvent>::update(::std::sync::Arc::clone(&self.output_boundary), &event).await?;

        let mut videos = 0;

        for channel in &channels {
            let request = ProcessChannelRequestModel { channel: channel.clone() };
            if let Err(err) = ::std::sync::Arc::clone(&self.channel_processor).accept(request).await {
                ::tracing::error!(channel = %channel.id, "channel not processed: {err:#}");
            }

            let mut channel_videos = match ::std::sync::Arc::clone(&self.library).videos(channel).await {
                Ok(channel_videos) => channel_videos,
                Err(err) => {
                    ::tracing::error!(channel = %channel.id, "videos not listed: {err:#}");
                    continue;
                },
            };

            while let Some(video) = channel_videos.next().await {
                videos += 1;

                let id = video.id.clone();
                let request = ProcessVideoRequestModel { video };
                if let Err(err) = ::std::sync::Arc::clone(&self.video_processor).accept(request).await {
                    ::tracing::error!(video = %id, "video not processed: {err:#}");
                }
            }
        }

        let conversions = self.conversions.settle().await;

        let event = LibraryCompletedEvent { channels: channels.len(), videos, conversions };
        Update::<LibraryCompletedEvent>::update(::std::sync::Arc::clone(&self.output_boundary), &event).await?;

        ::std::sync::Arc::clone(&self.output_boundary).deactivate().await?;

        Ok(())
    }
}

/// Thumbnail conversions launched by the processors and not awaited by them.
pub struct PendingConversions {
    tasks: ::tokio::sync::Mutex<::tokio::task::JoinSet<()>>,
}

impl PendingConversions {
    pub fn new() -> Self {
        Self { tasks: ::tokio::sync::Mutex::new(::tokio::task::JoinSet::new()) }
    }

    pub async fn spawn<Task>(&self, task: Task)
    where
        Task: ::std::future::Future<Output = ()> + ::core::marker::Send + 'static,
    {
        self.tasks.lock().await.spawn(task);
    }

    /// Converts `source` into `target` in the background and reports the outcome once it settles.
    pub async fn launch<Boundary>(
        &self, converter: ::std::sync::Arc<dyn ThumbnailConverter>, output_boundary: ::std::sync::Arc<Boundary>,
        owner: ArtifactOwner, source: MaybeOwnedPath, target: MaybeOwnedPath,
    ) where
        Boundary: Update<ArtifactEvent> + ?Sized + 'static,
    {
        self.spawn(async move {
            let outcome = match converter.convert(&source, &target).await {
                Ok(()) => ArtifactOutcome::Created,
                Err(err) => {
                    ::tracing::warn!(source = %source.display(), "thumbnail not converted: {err:#}");
                    failed(&err)
                },
            };

            if let Err(err) = report(&output_boundary, &owner, ArtifactKind::Thumbnail, outcome).await {
                ::tracing::warn!("thumbnail outcome not reported: {err:#}");
            }
        })
        .await;
    }

    /// Waits for every launched conversion, returning how many settled.
    pub async fn settle(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        let mut settled = 0;

        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                ::tracing::error!("thumbnail conversion aborted: {err}");
            }

            settled += 1;
        }

        settled
    }
}

async fn report<Boundary>(
    output_boundary: &::std::sync::Arc<Boundary>, owner: &ArtifactOwner, kind: ArtifactKind, outcome: ArtifactOutcome,
) -> Fallible<()>
where
    Boundary: Update<ArtifactEvent> + ?Sized,
{
    let event = ArtifactEvent { owner: owner.clone(), kind, outcome };

    Update::<ArtifactEvent>::update(::std::sync::Arc::clone(output_boundary), &event).await
}

fn failed(err: &::anyhow::Error) -> ArtifactOutcome {
    ArtifactOutcome::Failed(format!("{err:#}").into())
}
