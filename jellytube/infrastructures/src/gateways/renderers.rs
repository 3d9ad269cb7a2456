use ::domain::Metadata;
use ::use_cases::gateways::DescriptorRenderer;

/// Renders Kodi/Jellyfin flavoured `.nfo` documents.
pub struct NfoRenderer {
    escape: EscapePolicy,
    clock: fn() -> ::chrono::DateTime<::chrono::Utc>,
}

/// Which characters of user supplied text get replaced by XML entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapePolicy {
    /// Only `&`, and only in the plot. Other markup passes through verbatim.
    #[default]
    Ampersand,
    /// `&`, `<`, `>`, `"` and `'` in every text element.
    Markup,
}

impl NfoRenderer {
    pub fn new(escape: EscapePolicy) -> Self {
        Self { escape, clock: ::chrono::Utc::now }
    }

    pub fn with_clock(self, clock: fn() -> ::chrono::DateTime<::chrono::Utc>) -> Self {
        Self { clock, ..self }
    }

    fn text<'a>(&self, text: &'a str) -> ::std::borrow::Cow<'a, str> {
        match self.escape {
            EscapePolicy::Ampersand => ::std::borrow::Cow::Borrowed(text),
            EscapePolicy::Markup => escape_markup(text),
        }
    }

    fn plot<'a>(&self, plot: &'a str) -> ::std::borrow::Cow<'a, str> {
        match self.escape {
            EscapePolicy::Ampersand if plot.contains('&') => plot.replace('&', "&amp;").into(),
            EscapePolicy::Ampersand => ::std::borrow::Cow::Borrowed(plot),
            EscapePolicy::Markup => escape_markup(plot),
        }
    }

    fn timestamp(&self) -> String {
        (self.clock)().to_rfc3339_opts(::chrono::SecondsFormat::Millis, true)
    }
}

impl DescriptorRenderer for NfoRenderer {
    fn render_video(&self, metadata: &Metadata) -> String {
        let title = self.text(present(metadata.title.as_deref()).unwrap_or(UNKNOWN_TITLE));
        let plot = self.plot(present(metadata.description.as_deref()).unwrap_or_default());
        let studio = self.text(present(metadata.uploader.as_deref()).unwrap_or(UNKNOWN_CHANNEL));
        let premiered = premiere(present(metadata.upload_date.as_deref()));
        let dateadded = self.timestamp();
        let year = year(&premiered);
        let uniqueid = self.text(present(metadata.id.as_deref()).unwrap_or_default());

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<movie>
  <title>{title}</title>
  <plot>{plot}</plot>
  <studio>{studio}</studio>
  <premiered>{premiered}</premiered>
  <dateadded>{dateadded}</dateadded>
  <aired>{premiered}</aired>
  <year>{year}</year>
  <uniqueid type="youtube">{uniqueid}</uniqueid>
  <genre>{GENRE}</genre>
</movie>"#
        )
    }

    fn render_channel(&self, metadata: &Metadata) -> String {
        let title = self.text(
            present(metadata.channel.as_deref())
                .or_else(|| present(metadata.uploader.as_deref()))
                .unwrap_or(UNKNOWN_CHANNEL),
        );
        let plot = self.plot(present(metadata.description.as_deref()).unwrap_or_default());
        let premiered = premiere(present(metadata.upload_date.as_deref()));
        let dateadded = self.timestamp();
        let year = year(&premiered);
        let uniqueid = self.text(
            present(metadata.id.as_deref())
                .or_else(|| present(metadata.channel_id.as_deref()))
                .unwrap_or_default(),
        );

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<tvshow>
  <title>{title}</title>
  <plot>{plot}</plot>
  <studio>{STUDIO}</studio>
  <premiered>{premiered}</premiered>
  <dateadded>{dateadded}</dateadded>
  <year>{year}</year>
  <uniqueid type="youtube">{uniqueid}</uniqueid>
  <genre>{GENRE}</genre>
</tvshow>"#
        )
    }
}

// Empty strings count as missing.
fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|field| !field.is_empty())
}

/// `YYYYMMDD` becomes `YYYY-MM-DD`; anything else becomes an empty date.
fn premiere(upload_date: Option<&str>) -> String {
    static UPLOAD_DATE: ::once_cell::sync::Lazy<::regex::Regex> =
        ::once_cell::sync::Lazy::new(|| ::regex::Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})$").unwrap());

    upload_date
        .and_then(|upload_date| UPLOAD_DATE.captures(upload_date))
        .map(|date| format!("{}-{}-{}", &date[1], &date[2], &date[3]))
        .unwrap_or_default()
}

fn year(premiered: &str) -> &str {
    premiered.split('-').next().unwrap_or_default()
}

fn escape_markup(text: &str) -> ::std::borrow::Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return ::std::borrow::Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + text.len() / 8);

    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            character => escaped.push(character),
        }
    }

    escaped.into()
}

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_CHANNEL: &str = "Unknown Channel";
const STUDIO: &str = "YouTube";
const GENRE: &str = "YouTube";

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_clock() -> ::chrono::DateTime<::chrono::Utc> {
        use ::chrono::TimeZone as _;

        ::chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap()
    }

    fn renderer(escape: EscapePolicy) -> NfoRenderer {
        NfoRenderer::new(escape).with_clock(fixed_clock)
    }

    fn element<'a>(document: &'a str, name: &str) -> &'a str {
        let start = document.find(&format!("<{name}")).unwrap();
        let start = start + document[start..].find('>').unwrap() + 1;
        let end = start + document[start..].find(&format!("</{name}>")).unwrap();

        &document[start..end]
    }

    #[test]
    fn video_descriptor_has_the_movie_shape() {
        let metadata = Metadata {
            id: Some("abc123".into()),
            title: Some("First upload".into()),
            description: Some("Hello".into()),
            uploader: Some("Someone".into()),
            upload_date: Some("20230115".into()),
            ..Default::default()
        };

        let document = renderer(EscapePolicy::Ampersand).render_video(&metadata);

        assert_eq!(
            document,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<movie>
  <title>First upload</title>
  <plot>Hello</plot>
  <studio>Someone</studio>
  <premiered>2023-01-15</premiered>
  <dateadded>2024-03-01T10:20:30.000Z</dateadded>
  <aired>2023-01-15</aired>
  <year>2023</year>
  <uniqueid type="youtube">abc123</uniqueid>
  <genre>YouTube</genre>
</movie>"#
        );
    }

    #[test]
    fn channel_descriptor_has_the_tvshow_shape() {
        let metadata = Metadata {
            channel: Some("Some Channel".into()),
            channel_id: Some("UCabc".into()),
            description: Some("About".into()),
            ..Default::default()
        };

        let document = renderer(EscapePolicy::Ampersand).render_channel(&metadata);

        assert_eq!(
            document,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<tvshow>
  <title>Some Channel</title>
  <plot>About</plot>
  <studio>YouTube</studio>
  <premiered></premiered>
  <dateadded>2024-03-01T10:20:30.000Z</dateadded>
  <year></year>
  <uniqueid type="youtube">UCabc</uniqueid>
  <genre>YouTube</genre>
</tvshow>"#
        );
    }

    #[test]
    fn missing_or_malformed_dates_render_empty() {
        for upload_date in [None, Some(""), Some("2023-01-15"), Some("2023011"), Some("202301150"), Some("2023O115")] {
            let metadata = Metadata { upload_date: upload_date.map(Into::into), ..Default::default() };
            let document = renderer(EscapePolicy::Ampersand).render_video(&metadata);

            assert_eq!(element(&document, "premiered"), "", "{upload_date:?}");
            assert_eq!(element(&document, "aired"), "", "{upload_date:?}");
            assert_eq!(element(&document, "year"), "", "{upload_date:?}");
        }
    }

    #[test]
    fn non_ascii_digits_are_not_a_date() {
        let metadata = Metadata { upload_date: Some("٢٠٢٣٠١١٥".into()), ..Default::default() };
        let document = renderer(EscapePolicy::Ampersand).render_video(&metadata);

        assert_eq!(element(&document, "premiered"), "");
    }

    #[test]
    fn ampersand_policy_escapes_only_the_plot_ampersand() {
        let metadata = Metadata {
            title: Some("Tom & Jerry".into()),
            description: Some("Rock & Roll <tag> \"quoted\"".into()),
            ..Default::default()
        };

        let document = renderer(EscapePolicy::Ampersand).render_video(&metadata);

        assert_eq!(element(&document, "plot"), "Rock &amp; Roll <tag> \"quoted\"");
        assert_eq!(element(&document, "title"), "Tom & Jerry");
    }

    #[test]
    fn markup_policy_escapes_every_text_element() {
        let metadata = Metadata {
            title: Some("Tom & Jerry".into()),
            description: Some("Rock & Roll <tag>".into()),
            uploader: Some("\"Quotes\" 'n' <Co>".into()),
            ..Default::default()
        };

        let document = renderer(EscapePolicy::Markup).render_video(&metadata);

        assert_eq!(element(&document, "plot"), "Rock &amp; Roll &lt;tag&gt;");
        assert_eq!(element(&document, "title"), "Tom &amp; Jerry");
        assert_eq!(element(&document, "studio"), "&quot;Quotes&quot; &apos;n&apos; &lt;Co&gt;");
    }

    #[test]
    fn video_defaults_fill_missing_fields() {
        let document = renderer(EscapePolicy::Ampersand).render_video(&Metadata::default());

        assert_eq!(element(&document, "title"), "Unknown Title");
        assert_eq!(element(&document, "plot"), "");
        assert_eq!(element(&document, "studio"), "Unknown Channel");
        assert_eq!(element(&document, "uniqueid"), "");
    }

    #[test]
    fn empty_fields_count_as_missing() {
        let metadata = Metadata { title: Some("".into()), uploader: Some("".into()), ..Default::default() };
        let document = renderer(EscapePolicy::Ampersand).render_video(&metadata);

        assert_eq!(element(&document, "title"), "Unknown Title");
        assert_eq!(element(&document, "studio"), "Unknown Channel");
    }

    #[test]
    fn channel_title_falls_back_to_the_uploader() {
        let metadata = Metadata { uploader: Some("Uploader Name".into()), ..Default::default() };
        let document = renderer(EscapePolicy::Ampersand).render_channel(&metadata);

        assert_eq!(element(&document, "title"), "Uploader Name");

        let document = renderer(EscapePolicy::Ampersand).render_channel(&Metadata::default());

        assert_eq!(element(&document, "title"), "Unknown Channel");
    }

    #[test]
    fn channel_uniqueid_prefers_id_over_channel_id() {
        let metadata = Metadata {
            id: Some("UCfromid".into()),
            channel_id: Some("UCfromchannelid".into()),
            ..Default::default()
        };

        let document = renderer(EscapePolicy::Ampersand).render_channel(&metadata);

        assert_eq!(element(&document, "uniqueid"), "UCfromid");
    }

    #[test]
    fn dateadded_follows_the_wall_clock() {
        let before = ::chrono::Utc::now();
        let document = NfoRenderer::new(EscapePolicy::Ampersand).render_video(&Metadata::default());
        let after = ::chrono::Utc::now();

        let dateadded = ::chrono::DateTime::parse_from_rfc3339(element(&document, "dateadded"))
            .unwrap()
            .with_timezone(&::chrono::Utc);

        assert!(element(&document, "dateadded").ends_with('Z'));
        assert!(dateadded >= before - ::chrono::Duration::milliseconds(1) && dateadded <= after);
    }
}
