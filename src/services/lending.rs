//! Lending service: borrow, return and record queries

use chrono::Utc;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        account::Claims,
        lending::{BorrowRequest, LendingQuery, LendingRecord, NewLoan},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Records visible to the caller. Readers only ever see their own.
    pub async fn list_records(&self, claims: &Claims, query: &LendingQuery) -> AppResult<Vec<LendingRecord>> {
        let reader_id = if claims.is_librarian() {
            query.reader_id.as_deref().filter(|id| !id.is_empty())
        } else {
            Some(claims.sub.as_str())
        };
        self.repository.lending.list(reader_id, query.status).await
    }

    pub async fn get_record(&self, claims: &Claims, id: i32) -> AppResult<LendingRecord> {
        let record = self.repository.lending.get_by_id(id).await?;
        claims.require_self_or_librarian(&record.reader_id)?;
        Ok(record)
    }

    /// Lend a book to a reader on behalf of the authenticated librarian
    pub async fn borrow(&self, claims: &Claims, request: &BorrowRequest) -> AppResult<LendingRecord> {
        let book_id = request.book_id.trim();
        let reader_id = request.reader_id.trim();
        if book_id.is_empty() || reader_id.is_empty() {
            return Err(AppError::Validation("book_id and reader_id are required".to_string()));
        }

        let loan = NewLoan {
            book_id: book_id.to_string(),
            reader_id: reader_id.to_string(),
            librarian_id: Some(claims.sub.clone()),
            borrow_date: Utc::now(),
            period_days: self.config.period_days,
            max_active_loans: self.config.max_active_loans,
        };

        let record = self.repository.lending.borrow(&loan).await?;
        tracing::info!(
            "Librarian {} lent {} to {} (record {}, due {})",
            claims.sub, record.book_name, record.reader_id, record.id, record.due_date
        );
        Ok(record)
    }

    pub async fn return_book(&self, id: i32) -> AppResult<LendingRecord> {
        let record = self.repository.lending.return_book(id).await?;
        tracing::info!("Record {} returned ({})", record.id, record.book_name);
        Ok(record)
    }

    pub async fn overdue_loans(&self) -> AppResult<Vec<LendingRecord>> {
        self.repository.lending.overdue().await
    }
}
