use crate::domain::*;
use crate::error::Result;
use crate::storage::DataStore;
use chrono::NaiveDate;
use tracing::debug;

/// Password written onto user rows fabricated to satisfy a reference, and
/// onto `user` rows that omit the password column. Part of the data
/// contract with the surrounding application.
pub const DEFAULT_PASSWORD: &str = "changeme";

/// Natural-key get-or-create over the backing store.
///
/// Every method looks up first and creates a stub row on a miss, returning
/// the stable identifier either way. The record loop is sequential, so
/// lookup and insert behave as one logical step per entity.
pub struct EntityResolver<'a> {
    store: &'a dyn DataStore,
}

impl<'a> EntityResolver<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Resolve a user by username, fabricating a minimal account with the
    /// default password when absent.
    pub async fn resolve_user(&self, username: &str) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_natural_key(&NaturalKey::Username(username.to_string()))
            .await?
        {
            return Ok(id);
        }
        let id = self
            .store
            .create(NewEntity::User(NewUser {
                username: username.to_string(),
                email: None,
                password: DEFAULT_PASSWORD.to_string(),
            }))
            .await?;
        debug!(%id, username, "created stub user");
        Ok(id)
    }

    /// Resolve a user reference that may be a username or a raw numeric id.
    ///
    /// Numeric ids are validated against the store and yield `None` when no
    /// such user exists; usernames resolve or create as usual.
    pub async fn resolve_user_ref(&self, value: &str) -> Result<Option<EntityId>> {
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            let Ok(raw) = value.parse::<i64>() else {
                return Ok(None);
            };
            return self
                .store
                .find_by_natural_key(&NaturalKey::UserId(EntityId(raw)))
                .await;
        }
        Ok(Some(self.resolve_user(value).await?))
    }

    /// Resolve a title by name, creating a stub carrying only the name and
    /// the given release date when absent.
    pub async fn resolve_title(
        &self,
        name: &str,
        release_date: Option<NaiveDate>,
    ) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_natural_key(&NaturalKey::TitleName {
                name: name.to_string(),
                release_date: None,
            })
            .await?
        {
            return Ok(id);
        }
        let id = self
            .store
            .create(NewEntity::Title(NewTitle {
                name: name.to_string(),
                release_date,
                language: None,
                description: None,
            }))
            .await?;
        debug!(%id, name, "created stub title");
        Ok(id)
    }

    pub async fn resolve_genre(&self, name: &str) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_natural_key(&NaturalKey::GenreName(name.to_string()))
            .await?
        {
            return Ok(id);
        }
        let id = self
            .store
            .create(NewEntity::Genre(NewGenre { name: name.to_string() }))
            .await?;
        debug!(%id, name, "created stub genre");
        Ok(id)
    }

    pub async fn resolve_person(&self, name: &str) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_natural_key(&NaturalKey::PersonName(name.to_string()))
            .await?
        {
            return Ok(id);
        }
        let id = self
            .store
            .create(NewEntity::Person(NewPerson {
                name: name.to_string(),
                date_of_birth: None,
                biography: None,
                age: None,
            }))
            .await?;
        debug!(%id, name, "created stub cast member");
        Ok(id)
    }

    pub async fn resolve_studio(&self, name: &str) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_natural_key(&NaturalKey::StudioName(name.to_string()))
            .await?
        {
            return Ok(id);
        }
        let id = self
            .store
            .create(NewEntity::Studio(NewStudio { name: name.to_string(), country: None }))
            .await?;
        debug!(%id, name, "created stub studio");
        Ok(id)
    }

    pub async fn resolve_platform(&self, name: &str) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_natural_key(&NaturalKey::PlatformName(name.to_string()))
            .await?
        {
            return Ok(id);
        }
        let id = self
            .store
            .create(NewEntity::Platform(NewPlatform {
                name: name.to_string(),
                subscription_type: None,
            }))
            .await?;
        debug!(%id, name, "created stub platform");
        Ok(id)
    }
}
