//! Collection request parameters
//!
//! `CollectionRequestParams` turns paging and sorting options into a query string.

/// Upper bound for `size`; the backend rejects larger pages.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Paging and sorting of a collection request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionRequestParams {
    /// 0-based page index
    pub page: Option<u32>,
    /// items per page
    pub size: Option<u32>,
    /// sort expressions such as `projectName,asc`, applied in order
    pub sort: Vec<String>,
}

impl CollectionRequestParams {
    pub fn paged(page: u32, size: u32) -> Self {
        Self { page: Some(page), size: Some(size), sort: Vec::new() }
    }

    pub fn sorted_by(mut self, expression: impl Into<String>) -> Self {
        self.sort.push(expression.into());
        self
    }

    /// Query string without leading `?`; empty when nothing is set.
    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(format!("page={page}"));
        }
        if let Some(size) = self.size {
            pairs.push(format!("size={}", size.clamp(1, MAX_PAGE_SIZE)));
        }
        for expression in &self.sort {
            pairs.push(format!("sort={}", urlencoding::encode(expression)));
        }
        pairs.join("&")
    }

    /// Appends the query to `url`.
    pub fn apply(&self, url: &str) -> String {
        append_query(url, &self.to_query())
    }
}

/// Appends `query` using `?` or `&` depending on whether `url` already has one.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}
