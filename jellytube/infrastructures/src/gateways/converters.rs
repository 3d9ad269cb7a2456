use ::anyhow::Context as _;
use ::async_trait::async_trait;
use ::use_cases::gateways::ThumbnailConverter;

use crate::utils::aliases::Fallible;

/// Re-encodes downloaded thumbnails as JPEG, which every media server can display.
#[derive(::bon::Builder)]
pub struct ImageThumbnailConverter {
    #[builder(default = DEFAULT_QUALITY)]
    quality: u8,
}

#[async_trait]
impl ThumbnailConverter for ImageThumbnailConverter {
    async fn convert(
        self: ::std::sync::Arc<Self>, source: &::std::path::Path, target: &::std::path::Path,
    ) -> Fallible<()> {
        let staging = staging(target);

        let encoded = {
            let source = source.to_owned();
            let quality = self.quality;

            ::tokio::task::spawn_blocking(move || encode(&source, quality)).await?
        }
        .with_context(|| format!("could not convert {}", source.display()))?;

        let written = async {
            ::tokio::fs::write(&staging, &encoded).await?;
            ::tokio::fs::rename(&staging, target).await
        }
        .await;

        if let Err(err) = written {
            let _ = ::tokio::fs::remove_file(&staging).await;
            return Err(err).with_context(|| format!("could not write {}", target.display()));
        }

        ::tracing::debug!(source = %source.display(), target = %target.display(), "thumbnail converted");

        Ok(())
    }
}

fn encode(source: &::std::path::Path, quality: u8) -> Fallible<Vec<u8>> {
    let image = ::image::ImageReader::open(source)?.with_guessed_format()?.decode()?.into_rgb8();

    let mut encoded = ::std::io::Cursor::new(Vec::new());
    let encoder = ::image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded, quality);
    image.write_with_encoder(encoder)?;

    Ok(encoded.into_inner())
}

fn staging(target: &::std::path::Path) -> ::std::path::PathBuf {
    let mut staging = target.as_os_str().to_owned();
    staging.push(STAGING_SUFFIX);
    staging.into()
}

const DEFAULT_QUALITY: u8 = 90;
const STAGING_SUFFIX: &str = ".partial";

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> ::std::sync::Arc<ImageThumbnailConverter> {
        ::std::sync::Arc::new(ImageThumbnailConverter::builder().build())
    }

    fn gradient() -> ::image::RgbImage {
        ::image::RgbImage::from_fn(32, 18, |x, y| ::image::Rgb([(x * 8) as u8, (y * 14) as u8, 128]))
    }

    #[tokio::test]
    async fn webp_becomes_jpeg() {
        let directory = ::tempfile::tempdir().unwrap();
        let source = directory.path().join("abc123.webp");
        let target = directory.path().join("abc123.jpg");
        gradient().save(&source).unwrap();

        converter().convert(&source, &target).await.unwrap();

        let format = ::image::ImageReader::open(&target).unwrap().with_guessed_format().unwrap().format();
        assert_eq!(format, Some(::image::ImageFormat::Jpeg));

        let converted = ::image::open(&target).unwrap();
        assert_eq!((converted.width(), converted.height()), (32, 18));
        assert!(!staging(&target).exists());
    }

    #[tokio::test]
    async fn format_is_guessed_from_content() {
        let directory = ::tempfile::tempdir().unwrap();
        let png = directory.path().join("thumbnail.png");
        let source = directory.path().join("UCabc.webp");
        let target = directory.path().join("folder.jpg");
        gradient().save(&png).unwrap();
        ::std::fs::rename(&png, &source).unwrap();

        converter().convert(&source, &target).await.unwrap();

        assert!(::image::open(&target).is_ok());
    }

    #[tokio::test]
    async fn corrupt_source_leaves_no_target() {
        let directory = ::tempfile::tempdir().unwrap();
        let source = directory.path().join("abc123.webp");
        let target = directory.path().join("abc123.jpg");
        ::std::fs::write(&source, b"RIFF\0\0\0\0WEBPnot really").unwrap();

        let err = converter().convert(&source, &target).await.unwrap_err();

        assert!(format!("{err:#}").contains("could not convert"));
        assert!(!target.exists());
        assert!(!staging(&target).exists());
    }
}
