use crate::domain::*;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Data-access interface the importer writes through.
///
/// Resolution is lookup-before-insert: the importer calls
/// `find_by_natural_key` and only creates on a miss. The sequential record
/// loop is the single writer, so an implementation without uniqueness
/// constraints still sees resolution and creation as one logical step.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn find_by_natural_key(&self, key: &NaturalKey) -> Result<Option<EntityId>>;
    async fn create(&self, entity: NewEntity) -> Result<EntityId>;
    async fn link_exists(&self, link_type: LinkType, id_a: EntityId, id_b: EntityId) -> Result<bool>;
    async fn create_link(&self, link: LinkRecord) -> Result<()>;
}

/// In-memory store for the CLI, development, and testing.
pub struct InMemoryStore {
    next_id: AtomicI64,
    users: Mutex<HashMap<EntityId, User>>,
    titles: Mutex<HashMap<EntityId, Title>>,
    genres: Mutex<HashMap<EntityId, Genre>>,
    people: Mutex<HashMap<EntityId, Person>>,
    studios: Mutex<HashMap<EntityId, Studio>>,
    platforms: Mutex<HashMap<EntityId, Platform>>,
    episodes: Mutex<HashMap<EntityId, Episode>>,
    reviews: Mutex<Vec<Review>>,
    donations: Mutex<Vec<Donation>>,
    links: Mutex<Vec<LinkRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            users: Mutex::new(HashMap::new()),
            titles: Mutex::new(HashMap::new()),
            genres: Mutex::new(HashMap::new()),
            people: Mutex::new(HashMap::new()),
            studios: Mutex::new(HashMap::new()),
            platforms: Mutex::new(HashMap::new()),
            episodes: Mutex::new(HashMap::new()),
            reviews: Mutex::new(Vec::new()),
            donations: Mutex::new(Vec::new()),
            links: Mutex::new(Vec::new()),
        }
    }

    fn allocate_id(&self) -> EntityId {
        EntityId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn title_count(&self) -> usize {
        self.titles.lock().unwrap().len()
    }

    pub fn genre_count(&self) -> usize {
        self.genres.lock().unwrap().len()
    }

    pub fn person_count(&self) -> usize {
        self.people.lock().unwrap().len()
    }

    pub fn studio_count(&self) -> usize {
        self.studios.lock().unwrap().len()
    }

    pub fn platform_count(&self) -> usize {
        self.platforms.lock().unwrap().len()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.lock().unwrap().len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.lock().unwrap().len()
    }

    pub fn donation_count(&self) -> usize {
        self.donations.lock().unwrap().len()
    }

    pub fn link_count(&self, link_type: LinkType) -> usize {
        self.links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.link_type == link_type)
            .count()
    }

    pub fn find_user(&self, username: &str) -> Option<User> {
        let users = self.users.lock().unwrap();
        users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.lock().unwrap().clone()
    }

    pub fn donations(&self) -> Vec<Donation> {
        self.donations.lock().unwrap().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn find_by_natural_key(&self, key: &NaturalKey) -> Result<Option<EntityId>> {
        let found = match key {
            NaturalKey::Username(username) => {
                let users = self.users.lock().unwrap();
                users
                    .values()
                    .find(|u| u.username.eq_ignore_ascii_case(username))
                    .map(|u| u.id)
            }
            NaturalKey::UserEmail(email) => {
                let users = self.users.lock().unwrap();
                users
                    .values()
                    .find(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
                    .map(|u| u.id)
            }
            NaturalKey::UserId(id) => {
                let users = self.users.lock().unwrap();
                users.get(id).map(|u| u.id)
            }
            NaturalKey::TitleName { name, release_date } => {
                let titles = self.titles.lock().unwrap();
                titles
                    .values()
                    .find(|t| {
                        t.name.eq_ignore_ascii_case(name)
                            && release_date.map_or(true, |d| t.release_date == Some(d))
                    })
                    .map(|t| t.id)
            }
            NaturalKey::GenreName(name) => {
                let genres = self.genres.lock().unwrap();
                genres
                    .values()
                    .find(|g| g.name.eq_ignore_ascii_case(name))
                    .map(|g| g.id)
            }
            NaturalKey::PersonName(name) => {
                let people = self.people.lock().unwrap();
                people
                    .values()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .map(|p| p.id)
            }
            NaturalKey::StudioName(name) => {
                let studios = self.studios.lock().unwrap();
                studios
                    .values()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
                    .map(|s| s.id)
            }
            NaturalKey::PlatformName(name) => {
                let platforms = self.platforms.lock().unwrap();
                platforms
                    .values()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .map(|p| p.id)
            }
            NaturalKey::EpisodeNumber { title_id, season, episode_number } => {
                let episodes = self.episodes.lock().unwrap();
                episodes
                    .values()
                    .find(|e| {
                        e.title_id == *title_id
                            && e.season == *season
                            && e.episode_number == Some(*episode_number)
                    })
                    .map(|e| e.id)
            }
            NaturalKey::EpisodeId(id) => {
                let episodes = self.episodes.lock().unwrap();
                episodes.get(id).map(|e| e.id)
            }
        };
        Ok(found)
    }

    async fn create(&self, entity: NewEntity) -> Result<EntityId> {
        let id = self.allocate_id();
        let kind = entity.kind();
        match entity {
            NewEntity::User(args) => {
                let mut users = self.users.lock().unwrap();
                users.insert(
                    id,
                    User {
                        id,
                        username: args.username,
                        email: args.email,
                        password: args.password,
                    },
                );
            }
            NewEntity::Title(args) => {
                let mut titles = self.titles.lock().unwrap();
                titles.insert(
                    id,
                    Title {
                        id,
                        name: args.name,
                        release_date: args.release_date,
                        language: args.language,
                        description: args.description,
                    },
                );
            }
            NewEntity::Genre(args) => {
                let mut genres = self.genres.lock().unwrap();
                genres.insert(id, Genre { id, name: args.name });
            }
            NewEntity::Person(args) => {
                let mut people = self.people.lock().unwrap();
                people.insert(
                    id,
                    Person {
                        id,
                        name: args.name,
                        date_of_birth: args.date_of_birth,
                        biography: args.biography,
                        age: args.age,
                    },
                );
            }
            NewEntity::Studio(args) => {
                let mut studios = self.studios.lock().unwrap();
                studios.insert(id, Studio { id, name: args.name, country: args.country });
            }
            NewEntity::Platform(args) => {
                let mut platforms = self.platforms.lock().unwrap();
                platforms.insert(
                    id,
                    Platform { id, name: args.name, subscription_type: args.subscription_type },
                );
            }
            NewEntity::Episode(args) => {
                let mut episodes = self.episodes.lock().unwrap();
                episodes.insert(
                    id,
                    Episode {
                        id,
                        title_id: args.title_id,
                        season: args.season,
                        episode_number: args.episode_number,
                        episode_title: args.episode_title,
                        air_date: args.air_date,
                    },
                );
            }
            NewEntity::Review(args) => {
                let mut reviews = self.reviews.lock().unwrap();
                reviews.push(Review {
                    id,
                    user_id: args.user_id,
                    title_id: args.title_id,
                    rating: args.rating,
                    comment: args.comment,
                });
            }
            NewEntity::Donation(args) => {
                let mut donations = self.donations.lock().unwrap();
                donations.push(Donation {
                    id,
                    user_id: args.user_id,
                    amount: args.amount,
                    comment: args.comment,
                });
            }
        }
        debug!(%id, kind, "created row");
        Ok(id)
    }

    async fn link_exists(&self, link_type: LinkType, id_a: EntityId, id_b: EntityId) -> Result<bool> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .any(|l| l.link_type == link_type && l.id_a == id_a && l.id_b == id_b))
    }

    async fn create_link(&self, link: LinkRecord) -> Result<()> {
        let mut links = self.links.lock().unwrap();
        debug!(link_type = ?link.link_type, id_a = %link.id_a, id_b = %link.id_b, "created link");
        links.push(link);
        Ok(())
    }
}
