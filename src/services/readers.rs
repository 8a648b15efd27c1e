//! Reader and librarian account management

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        librarian::{Librarian, LibrarianInput},
        reader::{Reader, ReaderInput, ReaderQuery},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReadersService {
    repository: Repository,
}

impl ReadersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List readers; returns (readers, total, page, per_page)
    pub async fn list_readers(&self, query: &ReaderQuery) -> AppResult<(Vec<Reader>, i64, i64, i64)> {
        self.repository.readers.list(query).await
    }

    pub async fn get_reader(&self, id: &str) -> AppResult<Reader> {
        self.repository.readers.get_by_id(id).await
    }

    pub async fn create_reader(&self, input: &ReaderInput) -> AppResult<Reader> {
        input.validate()?;
        let reader = self.repository.readers.create(input).await?;
        tracing::info!("Created reader {}", reader.id);
        Ok(reader)
    }

    pub async fn update_reader(&self, id: &str, input: &ReaderInput) -> AppResult<Reader> {
        input.validate()?;
        self.repository.readers.update(id, input).await
    }

    pub async fn delete_reader(&self, id: &str) -> AppResult<()> {
        self.repository.readers.delete(id).await?;
        tracing::info!("Deleted reader {}", id);
        Ok(())
    }

    pub async fn list_librarians(&self) -> AppResult<Vec<Librarian>> {
        self.repository.librarians.list().await
    }

    pub async fn get_librarian(&self, id: &str) -> AppResult<Librarian> {
        self.repository.librarians.get_by_id(id).await
    }

    pub async fn create_librarian(&self, input: &LibrarianInput) -> AppResult<Librarian> {
        input.validate()?;
        let librarian = self.repository.librarians.create(input).await?;
        tracing::info!("Created librarian {}", librarian.id);
        Ok(librarian)
    }
}
