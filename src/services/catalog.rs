//! Catalog management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookInput, BookQuery, Category},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books; returns (books, total, page, per_page)
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64, i64, i64)> {
        self.repository.books.list(query).await
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        input.validate()?;
        let book = self.repository.books.create(input).await?;
        tracing::info!("Created book {} ({})", book.name, book.id);
        Ok(book)
    }

    pub async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Book> {
        input.validate()?;
        self.repository.books.update(id, input).await
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.books.list_categories().await
    }
}
