//! Page arithmetic for list endpoints

use serde::Serialize;

use super::DomainError;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn from_query(page: Option<u64>, page_size: Option<u64>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(DomainError::Validation("page must be at least 1".to_string()));
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::Validation(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        // The row offset has to fit the signed 64-bit OFFSET SQLite accepts
        match (page - 1).checked_mul(page_size) {
            Some(offset) if offset <= i64::MAX as u64 => {}
            _ => {
                return Err(DomainError::Validation(
                    "page is out of range".to_string(),
                ))
            }
        }
        Ok(Self { page, page_size })
    }

    /// 0-based index as expected by the SeaORM paginator
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub success: bool,
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            success: true,
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: total_pages(total, request.page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            success: self.success,
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}
