//! `RwLock`-backed repositories for tests and local development.

mod products;
mod promotions;
mod users;

pub use products::InMemoryProductRepository;
pub use promotions::InMemoryPromotionRepository;
pub use users::InMemoryUserDirectory;

use bazaar_core::RepositoryError;

fn poisoned<E>(_: E) -> RepositoryError {
    RepositoryError::backend("lock poisoned")
}
