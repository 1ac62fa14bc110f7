mod articles;
mod filters;
mod preferences;
mod schema;
mod search;
mod types;

pub use filters::{merge_with_defaults, DEFAULT_CATEGORIES, DEFAULT_COUNTRIES};
pub use schema::Database;
pub use types::{Article, Category, Country, DatabaseError, NewArticle, Search};
