pub(crate) mod utils;

use ::infrastructures::boundaries::LibraryView;
use ::infrastructures::gateways::converters::ImageThumbnailConverter;
use ::infrastructures::gateways::downloaders::CommandExecutor;
use ::infrastructures::gateways::downloaders::TokioCommandExecutor;
use ::infrastructures::gateways::downloaders::YtdlpDownloader;
use ::infrastructures::gateways::renderers::EscapePolicy;
use ::infrastructures::gateways::renderers::NfoRenderer;
use ::infrastructures::gateways::repositories::FilesystemLibraryRepository;
use ::infrastructures::gateways::repositories::FilesystemSidecarRepository;
use ::infrastructures::gateways::repositories::JsonMetadataRepository;
use ::use_cases::boundaries::Accept;
use ::use_cases::boundaries::ProcessChannelOutputBoundary;
use ::use_cases::boundaries::ProcessChannelRequestModel;
use ::use_cases::boundaries::ProcessLibraryOutputBoundary;
use ::use_cases::boundaries::ProcessLibraryRequestModel;
use ::use_cases::boundaries::ProcessVideoOutputBoundary;
use ::use_cases::boundaries::ProcessVideoRequestModel;
use ::use_cases::gateways::ChannelMetadataDownloader;
use ::use_cases::gateways::DescriptorRenderer;
use ::use_cases::gateways::LibraryRepository;
use ::use_cases::gateways::MetadataRepository;
use ::use_cases::gateways::SidecarRepository;
use ::use_cases::gateways::ThumbnailConverter;
use ::use_cases::gateways::VideoMetadataDownloader;
use ::use_cases::interactors::PendingConversions;
use ::use_cases::interactors::ProcessChannelInteractor;
use ::use_cases::interactors::ProcessLibraryInteractor;
use ::use_cases::interactors::ProcessVideoInteractor;

use crate::utils::aliases::Fallible;
use crate::utils::extensions::OptionExt;

#[tokio::main]
async fn main() -> Fallible<()> {
    let command = ::clap::Command::new("jellytube")
        .about("Writes Jellyfin/Kodi sidecars for a library of downloaded YouTube videos")
        .arg(
            ::clap::Arg::new("root")
                .short('r')
                .long("root")
                .default_value("media")
                .value_parser(::clap::value_parser!(::std::path::PathBuf)),
        )
        .arg(
            ::clap::Arg::new("extension")
                .short('e')
                .long("extension")
                .action(::clap::ArgAction::Append)
                .default_value("mp4")
                .value_parser(::clap::value_parser!(::std::string::String)),
        )
        .arg(
            ::clap::Arg::new("downloader")
                .long("downloader")
                .default_value("yt-dlp")
                .value_parser(::clap::value_parser!(::std::string::String)),
        )
        .arg(
            ::clap::Arg::new("escape")
                .long("escape")
                .default_value("ampersand")
                .value_parser(["ampersand", "markup"]),
        )
        .arg(
            ::clap::Arg::new("log-directory")
                .long("log-directory")
                .default_value("logs")
                .value_parser(::clap::value_parser!(::std::path::PathBuf)),
        );

    let matches = command.get_matches();

    let log_directory = matches.get_one::<::std::path::PathBuf>("log-directory").ok()?;
    let writer = ::tracing_appender::rolling::daily(log_directory, "jellytube.log");
    let (writer, _guard) = ::tracing_appender::non_blocking(writer);

    ::tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            ::tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| ::tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .init();

    let root = matches.get_one::<::std::path::PathBuf>("root").ok()?.to_owned();

    let video_extensions = matches
        .get_many::<::std::string::String>("extension")
        .ok()?
        .map(|extension| extension.trim_start_matches('.').to_owned().into())
        .collect::<Vec<::std::borrow::Cow<'static, str>>>();

    let escape = match matches.get_one::<::std::string::String>("escape").ok()?.as_ref() {
        "ampersand" => EscapePolicy::Ampersand,
        "markup" => EscapePolicy::Markup,
        escape => ::anyhow::bail!("unknown escape policy {escape}"),
    };

    let view = ::std::sync::Arc::new(LibraryView::new());

    let executor = ::std::sync::Arc::new(TokioCommandExecutor) as ::std::sync::Arc<dyn CommandExecutor>;
    let downloader = ::std::sync::Arc::new(
        YtdlpDownloader::builder()
            .program(matches.get_one::<::std::string::String>("downloader").ok()?.to_owned())
            .executor(executor)
            .build(),
    );

    let library = ::std::sync::Arc::new(FilesystemLibraryRepository::builder().video_extensions(video_extensions).build());
    let metadata = ::std::sync::Arc::new(JsonMetadataRepository) as ::std::sync::Arc<dyn MetadataRepository>;
    let sidecars = ::std::sync::Arc::new(FilesystemSidecarRepository) as ::std::sync::Arc<dyn SidecarRepository>;
    let renderer = ::std::sync::Arc::new(NfoRenderer::new(escape)) as ::std::sync::Arc<dyn DescriptorRenderer>;
    let converter =
        ::std::sync::Arc::new(ImageThumbnailConverter::builder().build()) as ::std::sync::Arc<dyn ThumbnailConverter>;
    let conversions = ::std::sync::Arc::new(PendingConversions::new());

    let process_video_interactor = ::std::sync::Arc::new(
        ProcessVideoInteractor::builder()
            .output_boundary(::std::sync::Arc::clone(&view) as ::std::sync::Arc<dyn ProcessVideoOutputBoundary>)
            .downloader(::std::sync::Arc::clone(&downloader) as ::std::sync::Arc<dyn VideoMetadataDownloader>)
            .metadata(::std::sync::Arc::clone(&metadata))
            .sidecars(::std::sync::Arc::clone(&sidecars))
            .renderer(::std::sync::Arc::clone(&renderer))
            .converter(::std::sync::Arc::clone(&converter))
            .conversions(::std::sync::Arc::clone(&conversions))
            .build(),
    );
    let process_channel_interactor = ::std::sync::Arc::new(
        ProcessChannelInteractor::builder()
            .output_boundary(::std::sync::Arc::clone(&view) as ::std::sync::Arc<dyn ProcessChannelOutputBoundary>)
            .downloader(::std::sync::Arc::clone(&downloader) as ::std::sync::Arc<dyn ChannelMetadataDownloader>)
            .metadata(::std::sync::Arc::clone(&metadata))
            .sidecars(::std::sync::Arc::clone(&sidecars))
            .renderer(::std::sync::Arc::clone(&renderer))
            .converter(::std::sync::Arc::clone(&converter))
            .conversions(::std::sync::Arc::clone(&conversions))
            .build(),
    );
    let process_library_interactor = ::std::sync::Arc::new(
        ProcessLibraryInteractor::builder()
            .output_boundary(::std::sync::Arc::clone(&view) as ::std::sync::Arc<dyn ProcessLibraryOutputBoundary>)
            .library(library as ::std::sync::Arc<dyn LibraryRepository>)
            .channel_processor(
                process_channel_interactor as ::std::sync::Arc<dyn Accept<ProcessChannelRequestModel>>,
            )
            .video_processor(process_video_interactor as ::std::sync::Arc<dyn Accept<ProcessVideoRequestModel>>)
            .conversions(conversions)
            .build(),
    );

    ::tracing::info!(root = %root.display(), "processing library");

    let request = ProcessLibraryRequestModel::builder().root(root).build();
    process_library_interactor.accept(request).await?;

    match view.failures() {
        0 => ::tracing::info!("library processed"),
        failures => ::tracing::warn!(failures, "library processed with failures, they are retried on the next run"),
    }

    Ok(())
}
