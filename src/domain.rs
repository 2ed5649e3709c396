use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier for any catalog entity.
///
/// The backing schema is a relational store with auto-increment keys, so
/// identifiers are plain integers wrapped for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

/// A movie or series. Movies and series share one model; series additionally
/// own episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Title {
    pub id: EntityId,
    pub name: String,
    pub release_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: EntityId,
    pub name: String,
}

/// A cast member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: EntityId,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub biography: Option<String>,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Studio {
    pub id: EntityId,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: EntityId,
    pub name: String,
    pub subscription_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: EntityId,
    pub title_id: EntityId,
    pub season: i32,
    pub episode_number: Option<i32>,
    pub episode_title: Option<String>,
    pub air_date: Option<NaiveDate>,
}

/// A user's review of a title. Not unique per (user, title); repeat reviews
/// append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: EntityId,
    pub user_id: EntityId,
    pub title_id: EntityId,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

/// Append-only donation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: EntityId,
    pub user_id: EntityId,
    pub amount: f64,
    pub comment: Option<String>,
}

/// Arguments for creating a user row; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub release_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewGenre {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub biography: Option<String>,
    pub age: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewStudio {
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlatform {
    pub name: String,
    pub subscription_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub title_id: EntityId,
    pub season: i32,
    pub episode_number: Option<i32>,
    pub episode_title: Option<String>,
    pub air_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: EntityId,
    pub title_id: EntityId,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub user_id: EntityId,
    pub amount: f64,
    pub comment: Option<String>,
}

/// Closed set of creatable rows, one variant per entity kind.
#[derive(Debug, Clone)]
pub enum NewEntity {
    User(NewUser),
    Title(NewTitle),
    Genre(NewGenre),
    Person(NewPerson),
    Studio(NewStudio),
    Platform(NewPlatform),
    Episode(NewEpisode),
    Review(NewReview),
    Donation(NewDonation),
}

impl NewEntity {
    /// Human-readable entity kind, used in log and diagnostic messages.
    pub fn kind(&self) -> &'static str {
        match self {
            NewEntity::User(_) => "user",
            NewEntity::Title(_) => "title",
            NewEntity::Genre(_) => "genre",
            NewEntity::Person(_) => "person",
            NewEntity::Studio(_) => "studio",
            NewEntity::Platform(_) => "platform",
            NewEntity::Episode(_) => "episode",
            NewEntity::Review(_) => "review",
            NewEntity::Donation(_) => "donation",
        }
    }
}

/// Natural-key lookups the importer performs against the store.
///
/// Name matches are case-insensitive. `TitleName` with a `None` release date
/// matches any title row with that name; with `Some(date)` the row's release
/// date must equal it.
#[derive(Debug, Clone, PartialEq)]
pub enum NaturalKey {
    Username(String),
    UserEmail(String),
    /// Raw internal id; used when a source row references a user by number.
    UserId(EntityId),
    TitleName {
        name: String,
        release_date: Option<NaiveDate>,
    },
    GenreName(String),
    PersonName(String),
    StudioName(String),
    PlatformName(String),
    EpisodeNumber {
        title_id: EntityId,
        season: i32,
        episode_number: i32,
    },
    /// Raw internal id; used when a source row references an episode by number.
    EpisodeId(EntityId),
}

/// Junction tables between resolved entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    TitleGenre,
    TitleCast,
    TitleStudio,
    TitlePlatform,
    Distribution,
    UserFollow,
    ContainsEpisode,
}

/// Optional columns carried on a junction row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub role: Option<String>,
    pub character_name: Option<String>,
    pub availability_date: Option<NaiveDate>,
    pub studio_id: Option<EntityId>,
    pub distribution_date: Option<NaiveDate>,
    pub territory: Option<String>,
}

/// A junction row between two resolved entities.
///
/// Endpoint conventions: `TitleGenre`/`TitleCast`/`TitleStudio`/
/// `TitlePlatform` and `Distribution` carry the title as `id_a`;
/// `Distribution` carries the platform as `id_b` with the studio in attrs;
/// `UserFollow` is follower to followed; `ContainsEpisode` is episode to
/// title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub link_type: LinkType,
    pub id_a: EntityId,
    pub id_b: EntityId,
    pub attrs: LinkAttrs,
}

impl LinkRecord {
    pub fn new(link_type: LinkType, id_a: EntityId, id_b: EntityId) -> Self {
        Self { link_type, id_a, id_b, attrs: LinkAttrs::default() }
    }

    pub fn with_attrs(mut self, attrs: LinkAttrs) -> Self {
        self.attrs = attrs;
        self
    }
}
