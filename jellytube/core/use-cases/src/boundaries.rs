use ::async_trait::async_trait;
use ::domain::Channel;
use ::domain::Video;

use crate::models::events::ArtifactEvent;
use crate::models::events::ChannelStartedEvent;
use crate::models::events::LibraryCompletedEvent;
use crate::models::events::LibraryStartedEvent;
use crate::utils::aliases::Fallible;
use crate::utils::aliases::MaybeOwnedPath;

#[async_trait]
pub trait Accept<Request>: ::core::marker::Send + ::core::marker::Sync {
    async fn accept(self: ::std::sync::Arc<Self>, request: Request) -> Fallible<()>;
}

#[async_trait]
pub trait Update<Event>: ::core::marker::Send + ::core::marker::Sync {
    async fn update(self: ::std::sync::Arc<Self>, event: &Event) -> Fallible<()>;
}

#[async_trait]
pub trait Activate: ::core::marker::Send + ::core::marker::Sync {
    async fn activate(self: ::std::sync::Arc<Self>) -> Fallible<()>;
    async fn deactivate(self: ::std::sync::Arc<Self>) -> Fallible<()>;
}

#[derive(::bon::Builder)]
#[builder(on(_, into))]
pub struct ProcessVideoRequestModel {
    pub video: Video,
}

pub trait ProcessVideoOutputBoundary: Update<ArtifactEvent> {}

impl<View> ProcessVideoOutputBoundary for View where View: Update<ArtifactEvent> {}

#[derive(::bon::Builder)]
#[builder(on(_, into))]
pub struct ProcessChannelRequestModel {
    pub channel: Channel,
}

pub trait ProcessChannelOutputBoundary: Update<ChannelStartedEvent> + Update<ArtifactEvent> {}

impl<View> ProcessChannelOutputBoundary for View where View: Update<ChannelStartedEvent> + Update<ArtifactEvent> {}

#[derive(::bon::Builder)]
#[builder(on(_, into))]
pub struct ProcessLibraryRequestModel {
    pub root: MaybeOwnedPath,
}

pub trait ProcessLibraryOutputBoundary: Activate + Update<LibraryStartedEvent> + Update<LibraryCompletedEvent> {}

impl<View> ProcessLibraryOutputBoundary for View where
    View: Activate + Update<LibraryStartedEvent> + Update<LibraryCompletedEvent>
{
}
