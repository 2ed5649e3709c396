//! Handlers for rows that encode a junction between two entities. Endpoints
//! resolve (or are fabricated) before any link is written, so a link row
//! never references a missing entity.

use crate::domain::*;
use crate::error::Result;
use crate::importer::linker::RelationshipLinker;
use crate::importer::normalize::parse_date;
use crate::importer::reader::RawRecord;
use crate::importer::report::Outcome;
use crate::importer::resolver::EntityResolver;
use crate::storage::DataStore;

const DEFAULT_TERRITORY: &str = "worldwide";

pub async fn title_genre_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let title = record.field(&["title", "movie_name"]);
    let genre = record.field(&["genre", "genre_name"]);
    let (Some(title), Some(genre)) = (title, genre) else {
        return Ok(Outcome::Skipped);
    };

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(title, None).await?;
    let genre_id = resolver.resolve_genre(genre).await?;

    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::TitleGenre, title_id, genre_id))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn title_cast_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let title = record.field(&["title", "movie_name"]);
    let actor = record.field(&["actor", "name"]);
    let (Some(title), Some(actor)) = (title, actor) else {
        return Ok(Outcome::Skipped);
    };
    let role = record.field_owned(&["role"]);
    let character_name = record.field_owned(&["character_name", "character"]);

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(title, None).await?;
    let person_id = resolver.resolve_person(actor).await?;

    let attrs = LinkAttrs { role, character_name, ..LinkAttrs::default() };
    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::TitleCast, title_id, person_id).with_attrs(attrs))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn title_studio_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let title = record.field(&["title", "movie_name"]);
    let studio = record.field(&["studio_name", "studio"]);
    let (Some(title), Some(studio)) = (title, studio) else {
        return Ok(Outcome::Skipped);
    };

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(title, None).await?;
    let studio_id = resolver.resolve_studio(studio).await?;

    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::TitleStudio, title_id, studio_id))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn title_platform_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let title = record.field(&["title", "movie_name"]);
    let platform = record.field(&["platform_name", "platform"]);
    let (Some(title), Some(platform)) = (title, platform) else {
        return Ok(Outcome::Skipped);
    };
    let availability_date = record
        .field(&["availability_date", "availability"])
        .and_then(parse_date);

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(title, None).await?;
    let platform_id = resolver.resolve_platform(platform).await?;

    let attrs = LinkAttrs { availability_date, ..LinkAttrs::default() };
    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::TitlePlatform, title_id, platform_id).with_attrs(attrs))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn distribution_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let title = record.field(&["title", "movie_name"]);
    let studio = record.field(&["studio_name", "studio"]);
    let platform = record.field(&["platform_name", "platform"]);
    let (Some(title), Some(studio), Some(platform)) = (title, studio, platform) else {
        return Ok(Outcome::Skipped);
    };
    let distribution_date = record.field(&["distribution_date", "date"]).and_then(parse_date);
    let territory = record
        .field_owned(&["territory", "region"])
        .unwrap_or_else(|| DEFAULT_TERRITORY.to_string());

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(title, None).await?;
    let studio_id = resolver.resolve_studio(studio).await?;
    let platform_id = resolver.resolve_platform(platform).await?;

    let attrs = LinkAttrs {
        studio_id: Some(studio_id),
        distribution_date,
        territory: Some(territory),
        ..LinkAttrs::default()
    };
    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::Distribution, title_id, platform_id).with_attrs(attrs))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn follow_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let follower = record.field(&["follower", "follower_username", "follower_id"]);
    let followed = record.field(&["followed", "followed_username", "followed_id"]);
    let (Some(follower), Some(followed)) = (follower, followed) else {
        return Ok(Outcome::Skipped);
    };

    let resolver = EntityResolver::new(store);
    let Some(follower_id) = resolver.resolve_user_ref(follower).await? else {
        return Ok(Outcome::Skipped);
    };
    let Some(followed_id) = resolver.resolve_user_ref(followed).await? else {
        return Ok(Outcome::Skipped);
    };
    // Following yourself is a business-rule no-op
    if follower_id == followed_id {
        return Ok(Outcome::Skipped);
    }

    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::UserFollow, follower_id, followed_id))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn contains_episode_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let episode = record.field(&["episode_id", "episode"]);
    let title = record.field(&["title", "movie_name"]);
    let (Some(episode), Some(title)) = (episode, title) else {
        return Ok(Outcome::Skipped);
    };
    let Ok(raw_id) = episode.parse::<i64>() else {
        return Ok(Outcome::Skipped);
    };
    let episode_id = EntityId(raw_id);

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(title, None).await?;

    // Cannot link to an episode that was never imported
    if store
        .find_by_natural_key(&NaturalKey::EpisodeId(episode_id))
        .await?
        .is_none()
    {
        return Ok(Outcome::Skipped);
    }

    RelationshipLinker::new(store)
        .ensure(LinkRecord::new(LinkType::ContainsEpisode, episode_id, title_id))
        .await?;
    Ok(Outcome::Inserted)
}
