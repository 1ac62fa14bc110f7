use crate::storage::{Category, Country, Database};
use crate::util::strip_control_chars;

pub const EMPTY_INPUT_MESSAGE: &str = "Please fill in at least one field.";

/// User-added countries and categories, and the combined lists built from them.
pub struct FiltersViewModel {
    db: Database,
    pub countries: Vec<Country>,
    pub categories: Vec<Category>,
    pub error: Option<String>,
}

impl FiltersViewModel {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            countries: Vec::new(),
            categories: Vec::new(),
            error: None,
        }
    }

    /// Reload the user-added entries.
    pub async fn load(&mut self) {
        let result = async {
            let countries = self.db.get_countries().await?;
            let categories = self.db.get_categories().await?;
            anyhow::Ok((countries, categories))
        }
        .await;

        match result {
            Ok((countries, categories)) => {
                self.countries = countries;
                self.categories = categories;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load filters");
                self.error = Some(format!("Failed to load filters: {}", e));
            }
        }
    }

    /// Save whichever of the two inputs is non-blank.
    ///
    /// Input that is only control characters counts as blank. Returns `false`
    /// and sets `error` when both are blank or a save fails; the lists are
    /// reloaded whenever anything was attempted.
    pub async fn add(&mut self, country_input: &str, category_input: &str) -> bool {
        let country_clean = strip_control_chars(country_input);
        let category_clean = strip_control_chars(category_input);
        let country = country_clean.trim();
        let category = category_clean.trim();

        if country.is_empty() && category.is_empty() {
            self.error = Some(EMPTY_INPUT_MESSAGE.to_string());
            return false;
        }

        self.error = None;
        if !country.is_empty() {
            if let Err(e) = self.db.add_country(country).await {
                tracing::warn!(error = %e, country = %country, "Failed to add country");
                self.error = Some(format!("Failed to add country: {}", e));
            }
        }
        if !category.is_empty() {
            if let Err(e) = self.db.add_category(category).await {
                tracing::warn!(error = %e, category = %category, "Failed to add category");
                self.error = Some(format!("Failed to add category: {}", e));
            }
        }

        let save_error = self.error.take();
        self.load().await;
        match save_error {
            Some(message) => {
                self.error = Some(message);
                false
            }
            None => self.error.is_none(),
        }
    }

    pub async fn remove_country(&mut self, id: i64) {
        let result = self.db.delete_country(id).await;
        self.after_remove(result, id, "country").await;
    }

    pub async fn remove_category(&mut self, id: i64) {
        let result = self.db.delete_category(id).await;
        self.after_remove(result, id, "category").await;
    }

    /// Defaults plus user countries, sorted and deduplicated.
    pub async fn combined_countries(&self) -> anyhow::Result<Vec<String>> {
        self.db.combined_countries().await
    }

    /// Defaults plus user categories, sorted and deduplicated.
    pub async fn combined_categories(&self) -> anyhow::Result<Vec<String>> {
        self.db.combined_categories().await
    }

    async fn after_remove(&mut self, result: anyhow::Result<bool>, id: i64, kind: &str) {
        match result {
            Ok(true) => self.load().await,
            Ok(false) => self.error = Some(format!("No {} with id {}", kind, id)),
            Err(e) => {
                tracing::warn!(error = %e, id, kind, "Failed to remove filter");
                self.error = Some(format!("Failed to remove {}: {}", kind, e));
            }
        }
    }
}
