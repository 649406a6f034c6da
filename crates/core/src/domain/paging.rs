use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_NUMBER: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub order_by: Option<String>,
    pub search_term: Option<String>,
    /// Entity-specific filters keyed by their wire name (`CompanyName`, `Country`, ...).
    #[serde(default)]
    pub filters: Vec<(String, String)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageWindow {
    pub fn offset(&self) -> usize {
        (self.page_number as usize - 1).saturating_mul(self.page_size as usize)
    }
}

impl QueryParams {
    pub fn page(page_number: u32, page_size: u32) -> Self {
        Self { page_number: Some(page_number), page_size: Some(page_size), ..Self::default() }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Fills in the page size when the caller left it open.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        if self.page_size.is_none() {
            self.page_size = Some(page_size.max(1));
        }
        self
    }

    /// True when the caller asked for the plain default listing.
    pub fn is_unfiltered(&self) -> bool {
        self.page_number.is_none()
            && self.page_size.is_none()
            && self.order_by.is_none()
            && self.search_term.is_none()
            && self.filters.is_empty()
    }

    pub fn search(&self) -> Option<&str> {
        self.search_term.as_deref().map(str::trim).filter(|term| !term.is_empty())
    }

    pub fn window(&self) -> PageWindow {
        self.window_with_default_size(DEFAULT_PAGE_SIZE)
    }

    pub fn window_with_default_size(&self, default_page_size: u32) -> PageWindow {
        PageWindow {
            page_number: self.page_number.unwrap_or(DEFAULT_PAGE_NUMBER).max(1),
            page_size: self.page_size.unwrap_or(default_page_size).max(1),
        }
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.order_by.as_deref().and_then(SortSpec::parse)
    }

    /// Query string pairs in the backend's naming.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .cloned()
            .collect();

        if let Some(page_number) = self.page_number {
            pairs.push(("PageNumber".to_string(), page_number.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("PageSize".to_string(), page_size.to_string()));
        }
        if let Some(order_by) = self.order_by.as_deref().filter(|value| !value.trim().is_empty()) {
            pairs.push(("OrderBy".to_string(), order_by.to_string()));
        }
        if let Some(search) = self.search() {
            pairs.push(("SearchTerm".to_string(), search.to_string()));
        }

        pairs
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parses `"<field> <direction>"`. Only `desc` selects descending order.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let field = parts.next()?.to_string();
        let direction = match parts.next() {
            Some(direction) if direction.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Some(Self { field, direction })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page_number: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            items,
            total_count,
            page_number: page_number.max(1),
            page_size,
            total_pages: total_pages(total_count, page_size),
        }
    }

    pub fn empty(page_number: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), 0, page_number, page_size)
    }

    pub fn has_next_page(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(page_size);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
