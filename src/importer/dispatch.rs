use crate::importer::reader::RawRecord;

/// Closed set of record kinds a source row can encode.
///
/// The tag vocabulary is a fixed wire contract shared with existing data
/// exports; synonyms and plural forms map to the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    User,
    Title,
    Genre,
    CastMember,
    Studio,
    Platform,
    Episode,
    Review,
    TitleGenre,
    TitleCast,
    TitleStudio,
    TitlePlatform,
    Distribution,
    Follow,
    Donation,
    ContainsEpisode,
}

impl RecordKind {
    /// Match a raw type tag against the registry. Tags are trimmed and
    /// lowercased before matching; unknown or empty tags return `None`.
    pub fn from_tag(tag: &str) -> Option<RecordKind> {
        match tag.trim().to_lowercase().as_str() {
            "user" | "users" => Some(RecordKind::User),
            "movie" | "movies" => Some(RecordKind::Title),
            "genre" | "genres" => Some(RecordKind::Genre),
            "cast" | "cast_member" | "cast_members" => Some(RecordKind::CastMember),
            "studio" | "studios" => Some(RecordKind::Studio),
            "platform" | "streaming_platform" | "streaming_platforms" => Some(RecordKind::Platform),
            "episode" | "episodes" => Some(RecordKind::Episode),
            "review" | "reviews" | "rating" | "ratings" => Some(RecordKind::Review),
            "movie_genre" => Some(RecordKind::TitleGenre),
            "movie_cast" => Some(RecordKind::TitleCast),
            "movie_studio" => Some(RecordKind::TitleStudio),
            "movie_platform" => Some(RecordKind::TitlePlatform),
            "distribution" | "movie_distribution" => Some(RecordKind::Distribution),
            "follow" | "user_follow" => Some(RecordKind::Follow),
            "donation" | "donations" => Some(RecordKind::Donation),
            "contains_episode" => Some(RecordKind::ContainsEpisode),
            _ => None,
        }
    }

    /// Read the type discriminator column from a record and dispatch.
    pub fn of_record(record: &RawRecord) -> Option<RecordKind> {
        RecordKind::from_tag(record.field(&["type", "record_type"]).unwrap_or(""))
    }

    /// Canonical tag, used in diagnostics and log events.
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::Title => "movie",
            RecordKind::Genre => "genre",
            RecordKind::CastMember => "cast",
            RecordKind::Studio => "studio",
            RecordKind::Platform => "platform",
            RecordKind::Episode => "episode",
            RecordKind::Review => "review",
            RecordKind::TitleGenre => "movie_genre",
            RecordKind::TitleCast => "movie_cast",
            RecordKind::TitleStudio => "movie_studio",
            RecordKind::TitlePlatform => "movie_platform",
            RecordKind::Distribution => "distribution",
            RecordKind::Follow => "follow",
            RecordKind::Donation => "donation",
            RecordKind::ContainsEpisode => "contains_episode",
        }
    }
}
