//! Typed records over the key-value store.

use super::KeyValueStore;
use crate::document::ImageRef;
use crate::error::{Error, Result, ResultExt};
use crate::generation::GenerationConfig;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PROFILE_KEY: &str = "draftsmith.profile";
pub const HISTORY_KEY: &str = "draftsmith.history";
pub const PREFERENCES_KEY: &str = "draftsmith.preferences";
pub const CATEGORIES_KEY: &str = "draftsmith.categories";
pub const DRAFT_KEY: &str = "draftsmith.draft";

/// Default bound on stored history entries.
const DEFAULT_MAX_HISTORY: usize = 50;

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub email: String,
}

impl UserProfile {
    pub fn validate(&self) -> Result<()> {
        if self.display_name.trim().is_empty() {
            return Err(Error::Validation("Name must not be empty".to_string()));
        }
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(Error::Validation(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        Ok(())
    }

    pub fn initials(&self) -> String {
        self.display_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// A finished article kept in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArticle {
    pub id: Uuid,
    pub topic: String,
    pub content: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<ImageRef>,
}

impl SavedArticle {
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        cover_image: Option<ImageRef>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            content: content.into(),
            date: Utc::now(),
            category: category.into(),
            cover_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub default_language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_language: String::from("English"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// The in-progress article, restored on the next launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub config: GenerationConfig,
    pub content: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub selected_image: Option<usize>,
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Library
// ─────────────────────────────────────────────────────────────────────────────

/// Profile, history, preferences, categories and draft for one user.
pub struct Library {
    store: Box<dyn KeyValueStore>,
    max_history: usize,
}

impl Library {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }

    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history.max(1);
    }

    /// Read a record, treating missing or corrupt data as the default.
    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let loaded = self.store.get(key).and_then(|raw| match raw {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(&raw).map_err(|e| Error::Storage {
                    key: key.to_string(),
                    message: format!("corrupt record: {}", e),
                })
            }
            _ => Ok(T::default()),
        });
        loaded.unwrap_or_warn_default(T::default(), "Failed to read library record")
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────

    pub fn profile(&self) -> Option<UserProfile> {
        self.read(PROFILE_KEY)
    }

    pub fn sign_in(&self, profile: UserProfile) -> Result<()> {
        profile.validate()?;
        let profile = UserProfile {
            display_name: profile.display_name.trim().to_string(),
            email: profile.email.trim().to_string(),
        };
        info!("Signed in as {}", profile.display_name);
        self.write(PROFILE_KEY, &Some(profile))
    }

    pub fn sign_out(&self) -> Result<()> {
        info!("Signed out");
        self.store.remove(PROFILE_KEY)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    /// Saved articles, newest first.
    pub fn history(&self) -> Vec<SavedArticle> {
        self.read(HISTORY_KEY)
    }

    /// Add an article to the front of history, replacing any entry with
    /// the same id and dropping the oldest beyond the bound.
    pub fn save_article(&self, article: SavedArticle) -> Result<()> {
        let mut history = self.history();
        history.retain(|existing| existing.id != article.id);
        history.insert(0, article);
        history.truncate(self.max_history);
        self.write(HISTORY_KEY, &history)
    }

    pub fn find_article(&self, id: Uuid) -> Option<SavedArticle> {
        self.history().into_iter().find(|a| a.id == id)
    }

    /// Returns `false` if no article had this id.
    pub fn delete_article(&self, id: Uuid) -> Result<bool> {
        let mut history = self.history();
        let before = history.len();
        history.retain(|a| a.id != id);
        if history.len() == before {
            return Ok(false);
        }
        self.write(HISTORY_KEY, &history)?;
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Preferences
    // ─────────────────────────────────────────────────────────────────────────

    pub fn preferences(&self) -> Preferences {
        self.read(PREFERENCES_KEY)
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        if preferences.default_language.trim().is_empty() {
            return Err(Error::Validation(
                "Default language must not be empty".to_string(),
            ));
        }
        self.write(PREFERENCES_KEY, preferences)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────────────────────

    pub fn categories(&self) -> Vec<Category> {
        self.read(CATEGORIES_KEY)
    }

    /// Add a category. Names are trimmed and must be unique ignoring case.
    pub fn add_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "Category name must not be empty".to_string(),
            ));
        }
        let mut categories = self.categories();
        let lowered = name.to_lowercase();
        if categories.iter().any(|c| c.name.to_lowercase() == lowered) {
            return Err(Error::Validation(format!(
                "Category '{}' already exists",
                name
            )));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        categories.push(category.clone());
        self.write(CATEGORIES_KEY, &categories)?;
        debug!("Added category {}", category.name);
        Ok(category)
    }

    pub fn remove_category(&self, id: Uuid) -> Result<bool> {
        let mut categories = self.categories();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Ok(false);
        }
        self.write(CATEGORIES_KEY, &categories)?;
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Draft
    // ─────────────────────────────────────────────────────────────────────────

    pub fn draft(&self) -> Option<Draft> {
        self.read(DRAFT_KEY)
    }

    pub fn save_draft(&self, draft: &Draft) -> Result<()> {
        self.write(DRAFT_KEY, &Some(draft))
    }

    pub fn clear_draft(&self) -> Result<()> {
        self.store.remove(DRAFT_KEY)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn library() -> Library {
        Library::new(Box::new(MemoryStore::new()))
    }

    fn profile(name: &str, email: &str) -> UserProfile {
        UserProfile {
            display_name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_sign_in_and_out() {
        let library = library();
        assert_eq!(library.profile(), None);

        library.sign_in(profile(" Ada Lovelace ", "ada@example.com")).unwrap();
        let stored = library.profile().unwrap();
        assert_eq!(stored.display_name, "Ada Lovelace");
        assert_eq!(stored.initials(), "AL");

        library.sign_out().unwrap();
        assert_eq!(library.profile(), None);
    }

    #[test]
    fn test_sign_in_validation() {
        let library = library();
        assert!(library.sign_in(profile("", "a@b.c")).is_err());
        assert!(library.sign_in(profile("Ada", "not-an-email")).is_err());
        assert!(library.sign_in(profile("Ada", "@b.c")).is_err());
        assert_eq!(library.profile(), None);
    }

    #[test]
    fn test_history_newest_first_and_bounded() {
        let mut library = library();
        library.set_max_history(2);
        let first = SavedArticle::new("One", "1", "", None);
        let second = SavedArticle::new("Two", "2", "", None);
        let third = SavedArticle::new("Three", "3", "", None);
        library.save_article(first.clone()).unwrap();
        library.save_article(second.clone()).unwrap();
        library.save_article(third.clone()).unwrap();

        let history = library.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, third.id);
        assert_eq!(history[1].id, second.id);
        assert!(library.find_article(first.id).is_none());
    }

    #[test]
    fn test_resaving_article_moves_it_to_front() {
        let library = library();
        let mut first = SavedArticle::new("One", "1", "", None);
        library.save_article(first.clone()).unwrap();
        library
            .save_article(SavedArticle::new("Two", "2", "", None))
            .unwrap();

        first.content = "edited".to_string();
        library.save_article(first.clone()).unwrap();
        let history = library.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], first);
    }

    #[test]
    fn test_delete_article() {
        let library = library();
        let article = SavedArticle::new("One", "1", "", None);
        library.save_article(article.clone()).unwrap();
        assert!(library.delete_article(article.id).unwrap());
        assert!(!library.delete_article(article.id).unwrap());
        assert!(library.history().is_empty());
    }

    #[test]
    fn test_categories_reject_case_insensitive_duplicates() {
        let library = library();
        let food = library.add_category("  Food ").unwrap();
        assert_eq!(food.name, "Food");
        assert!(matches!(
            library.add_category("FOOD"),
            Err(Error::Validation(_))
        ));
        assert!(library.add_category("   ").is_err());
        library.add_category("Travel").unwrap();
        assert_eq!(library.categories().len(), 2);

        assert!(library.remove_category(food.id).unwrap());
        assert!(!library.remove_category(food.id).unwrap());
        library.add_category("food").unwrap();
    }

    #[test]
    fn test_preferences() {
        let library = library();
        assert_eq!(library.preferences().default_language, "English");
        library
            .save_preferences(&Preferences {
                default_language: "German".to_string(),
            })
            .unwrap();
        assert_eq!(library.preferences().default_language, "German");
        assert!(library
            .save_preferences(&Preferences {
                default_language: " ".to_string(),
            })
            .is_err());
    }

    #[test]
    fn test_draft_save_load_clear() {
        let library = library();
        assert!(library.draft().is_none());

        let draft = Draft {
            config: GenerationConfig {
                topic: "Kites".to_string(),
                ..Default::default()
            },
            content: "# Kites".to_string(),
            images: vec![ImageRef::new("data:image/png;base64,AA==", "kite")],
            selected_image: Some(0),
            updated_at: Utc::now(),
        };
        library.save_draft(&draft).unwrap();
        assert_eq!(library.draft(), Some(draft));

        library.clear_draft().unwrap();
        assert!(library.draft().is_none());
    }

    #[test]
    fn test_corrupt_record_degrades_to_default() {
        let store = MemoryStore::new();
        store.set(HISTORY_KEY, "{not json").unwrap();
        store.set(CATEGORIES_KEY, "42").unwrap();
        let library = Library::new(Box::new(store));
        assert!(library.history().is_empty());
        assert!(library.categories().is_empty());

        library
            .save_article(SavedArticle::new("Fresh", "x", "", None))
            .unwrap();
        assert_eq!(library.history().len(), 1);
    }
}
