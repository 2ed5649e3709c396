//! Handlers for rows that describe a single entity. Each handler extracts
//! its fields through the synonym lists, applies the coercion rules, and
//! either inserts, skips (duplicate natural key or missing required field),
//! or surfaces a persistence failure for the record loop to count.

use crate::domain::*;
use crate::error::Result;
use crate::importer::normalize::{
    parse_age, parse_amount, parse_date, parse_episode_number, parse_rating, parse_season,
};
use crate::importer::reader::RawRecord;
use crate::importer::report::Outcome;
use crate::importer::resolver::{EntityResolver, DEFAULT_PASSWORD};
use crate::storage::DataStore;

pub async fn user_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(username) = record.field(&["username", "user"]) else {
        return Ok(Outcome::Skipped);
    };
    let email = record.field_owned(&["email"]);
    let password = record
        .field_owned(&["password"])
        .unwrap_or_else(|| DEFAULT_PASSWORD.to_string());

    if store
        .find_by_natural_key(&NaturalKey::Username(username.to_string()))
        .await?
        .is_some()
    {
        return Ok(Outcome::Skipped);
    }
    if let Some(email) = &email {
        if store
            .find_by_natural_key(&NaturalKey::UserEmail(email.clone()))
            .await?
            .is_some()
        {
            return Ok(Outcome::Skipped);
        }
    }

    store
        .create(NewEntity::User(NewUser { username: username.to_string(), email, password }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn title_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(name) = record.field(&["title", "movie_name", "name"]) else {
        return Ok(Outcome::Skipped);
    };
    let release_date = record
        .field(&["release_date", "date", "year"])
        .and_then(parse_date);
    let language = record.field_owned(&["language"]);
    let description = record.field_owned(&["description", "summary"]);

    if store
        .find_by_natural_key(&NaturalKey::TitleName {
            name: name.to_string(),
            release_date,
        })
        .await?
        .is_some()
    {
        return Ok(Outcome::Skipped);
    }

    store
        .create(NewEntity::Title(NewTitle {
            name: name.to_string(),
            release_date,
            language,
            description,
        }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn genre_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(name) = record.field(&["genre_name", "name", "genre"]) else {
        return Ok(Outcome::Skipped);
    };

    if store
        .find_by_natural_key(&NaturalKey::GenreName(name.to_string()))
        .await?
        .is_some()
    {
        return Ok(Outcome::Skipped);
    }

    store
        .create(NewEntity::Genre(NewGenre { name: name.to_string() }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn cast_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(name) = record.field(&["name", "actor"]) else {
        return Ok(Outcome::Skipped);
    };
    let date_of_birth = record.field(&["dob", "birthdate"]).and_then(parse_date);
    let biography = record.field_owned(&["bio", "biography"]);
    let age = parse_age(record.field(&["age"]));

    if store
        .find_by_natural_key(&NaturalKey::PersonName(name.to_string()))
        .await?
        .is_some()
    {
        return Ok(Outcome::Skipped);
    }

    store
        .create(NewEntity::Person(NewPerson {
            name: name.to_string(),
            date_of_birth,
            biography,
            age,
        }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn studio_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(name) = record.field(&["studio_name", "name"]) else {
        return Ok(Outcome::Skipped);
    };
    let country = record.field_owned(&["country"]);

    if store
        .find_by_natural_key(&NaturalKey::StudioName(name.to_string()))
        .await?
        .is_some()
    {
        return Ok(Outcome::Skipped);
    }

    store
        .create(NewEntity::Studio(NewStudio { name: name.to_string(), country }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn platform_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(name) = record.field(&["platform_name", "name"]) else {
        return Ok(Outcome::Skipped);
    };
    let subscription_type = record.field_owned(&["subscription_type", "subscription"]);

    if store
        .find_by_natural_key(&NaturalKey::PlatformName(name.to_string()))
        .await?
        .is_some()
    {
        return Ok(Outcome::Skipped);
    }

    store
        .create(NewEntity::Platform(NewPlatform {
            name: name.to_string(),
            subscription_type,
        }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn episode_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(series_title) = record.field(&["series_title", "title", "movie_name"]) else {
        return Ok(Outcome::Skipped);
    };
    let season = parse_season(record.field(&["season", "season_number"]));
    let episode_number = parse_episode_number(record.field(&["episode", "episode_number"]));
    let episode_title = record.field_owned(&["episode_title", "ep_title", "title"]);
    let air_date = record
        .field(&["release_date", "air_date", "date"])
        .and_then(parse_date);

    let resolver = EntityResolver::new(store);
    let title_id = resolver.resolve_title(series_title, air_date).await?;

    // Number-less episodes have no natural key and always append
    if let Some(number) = episode_number {
        if store
            .find_by_natural_key(&NaturalKey::EpisodeNumber {
                title_id,
                season,
                episode_number: number,
            })
            .await?
            .is_some()
        {
            return Ok(Outcome::Skipped);
        }
    }

    store
        .create(NewEntity::Episode(NewEpisode {
            title_id,
            season,
            episode_number,
            episode_title,
            air_date,
        }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn review_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let username = record.field(&["username", "user"]);
    let title = record.field(&["title", "movie_name"]);
    let (Some(username), Some(title)) = (username, title) else {
        return Ok(Outcome::Skipped);
    };
    let rating = record.field(&["rating"]).and_then(parse_rating);
    let comment = record.field_owned(&["comment", "review"]);

    let resolver = EntityResolver::new(store);
    let user_id = resolver.resolve_user(username).await?;
    let title_id = resolver.resolve_title(title, None).await?;

    store
        .create(NewEntity::Review(NewReview { user_id, title_id, rating, comment }))
        .await?;
    Ok(Outcome::Inserted)
}

pub async fn donation_row(store: &dyn DataStore, record: &RawRecord) -> Result<Outcome> {
    let Some(username) = record.field(&["username", "user", "user_id"]) else {
        return Ok(Outcome::Skipped);
    };
    let amount = parse_amount(record.field(&["donation_amount", "amount"]));
    let comment = record.field_owned(&["comment"]);

    let resolver = EntityResolver::new(store);
    let user_id = resolver.resolve_user(username).await?;

    store
        .create(NewEntity::Donation(NewDonation { user_id, amount, comment }))
        .await?;
    Ok(Outcome::Inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use std::sync::Arc;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        let headers = Arc::new(pairs.iter().map(|(h, _)| h.to_string()).collect::<Vec<_>>());
        let values = pairs.iter().map(|(_, v)| v.to_string()).collect();
        RawRecord::new(headers, values)
    }

    #[tokio::test]
    async fn user_row_without_username_is_skipped() {
        let store = InMemoryStore::new();
        let outcome = user_row(&store, &record(&[("email", "a@b.c")])).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_is_skipped() {
        let store = InMemoryStore::new();
        let first = record(&[("username", "alice"), ("email", "alice@example.com")]);
        let second = record(&[("username", "alice2"), ("email", "alice@example.com")]);

        assert_eq!(user_row(&store, &first).await.unwrap(), Outcome::Inserted);
        assert_eq!(user_row(&store, &second).await.unwrap(), Outcome::Skipped);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn user_row_without_password_gets_the_default() {
        let store = InMemoryStore::new();
        user_row(&store, &record(&[("username", "bob")])).await.unwrap();
        assert_eq!(store.find_user("bob").unwrap().password, DEFAULT_PASSWORD);
    }

    #[tokio::test]
    async fn title_row_accepts_year_column_as_release_date() {
        let store = InMemoryStore::new();
        let outcome = title_row(&store, &record(&[("title", "Heat"), ("year", "1995")]))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Inserted);

        // Same name and year on a second pass resolves to the existing row
        let outcome = title_row(&store, &record(&[("title", "Heat"), ("year", "1995")]))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(store.title_count(), 1);
    }

    #[tokio::test]
    async fn episode_row_creates_stub_series_and_dedupes_by_number() {
        let store = InMemoryStore::new();
        let row = record(&[
            ("series_title", "Severance"),
            ("season", "2"),
            ("episode", "3"),
            ("episode_title", "Who Is Alive?"),
            ("air_date", "2025-01-31"),
        ]);

        assert_eq!(episode_row(&store, &row).await.unwrap(), Outcome::Inserted);
        assert_eq!(episode_row(&store, &row).await.unwrap(), Outcome::Skipped);
        assert_eq!(store.title_count(), 1);
        assert_eq!(store.episode_count(), 1);
    }

    #[tokio::test]
    async fn episode_row_without_number_always_appends() {
        let store = InMemoryStore::new();
        let row = record(&[("series_title", "Severance"), ("season", "bonus")]);

        assert_eq!(episode_row(&store, &row).await.unwrap(), Outcome::Inserted);
        assert_eq!(episode_row(&store, &row).await.unwrap(), Outcome::Inserted);
        assert_eq!(store.episode_count(), 2);
    }

    #[tokio::test]
    async fn review_row_fabricates_user_and_title_stubs() {
        let store = InMemoryStore::new();
        let row = record(&[
            ("username", "ghost"),
            ("title", "Unseen Film"),
            ("rating", "8/10"),
            ("comment", "good"),
        ]);

        assert_eq!(review_row(&store, &row).await.unwrap(), Outcome::Inserted);
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.title_count(), 1);
        let reviews = store.reviews();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, Some(8.0));
    }

    #[tokio::test]
    async fn donation_amount_falls_back_to_zero() {
        let store = InMemoryStore::new();
        let row = record(&[("username", "carol"), ("amount", "not-a-number")]);

        assert_eq!(donation_row(&store, &row).await.unwrap(), Outcome::Inserted);
        assert_eq!(store.donations()[0].amount, 0.0);
    }
}
