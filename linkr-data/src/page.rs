use serde::Serialize;

/// Which slice of a collection a request asks for.
///
/// Clients address pages either by 1-based page number or by raw offset;
/// `number` is set only in the first case and decides how neighbouring pages
/// are written back into links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u64,
    limit: u64,
    number: Option<u64>,
}

impl PageRequest {
    /// Page `number` (1-based) of `limit` items.
    pub fn numbered(number: u64, limit: u64) -> Self {
        let number = number.max(1);
        let limit = limit.max(1);
        Self {
            offset: (number - 1).saturating_mul(limit),
            limit,
            number: Some(number),
        }
    }

    /// `limit` items starting at `offset`.
    pub fn at_offset(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: limit.max(1),
            number: None,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn number(&self) -> Option<u64> {
        self.number
    }

    pub fn is_first(&self) -> bool {
        self.offset == 0
    }

    pub fn first(&self) -> Self {
        self.with_offset(0)
    }

    pub fn next(&self) -> Self {
        self.with_offset(self.offset.saturating_add(self.limit))
    }

    /// The preceding page, or `None` on the first page.
    pub fn prev(&self) -> Option<Self> {
        (!self.is_first()).then(|| self.with_offset(self.offset.saturating_sub(self.limit)))
    }

    /// The page holding the last item of a collection of `total` items.
    pub fn last(&self, total: u64) -> Self {
        let last_offset = total.saturating_sub(1) / self.limit * self.limit;
        self.with_offset(last_offset)
    }

    /// Query parameters addressing this page, in the style it was requested.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self.number {
            Some(number) => vec![("page", number.to_string()), ("limit", self.limit.to_string())],
            None => vec![("offset", self.offset.to_string()), ("limit", self.limit.to_string())],
        }
    }

    fn with_offset(&self, offset: u64) -> Self {
        match self.number {
            Some(_) => Self::numbered(offset / self.limit + 1, self.limit),
            None => Self::at_offset(offset, self.limit),
        }
    }
}

/// What a fetch reported about the page it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    #[serde(skip)]
    request: PageRequest,
    pub offset: u64,
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub count: usize,
    #[serde(skip)]
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

impl PageMeta {
    pub fn new(request: PageRequest, count: usize, has_more: bool, total: Option<u64>) -> Self {
        let total_pages = total.map(|t| t.div_ceil(request.limit));
        Self {
            request,
            offset: request.offset,
            limit: request.limit,
            number: request.number,
            count,
            has_more,
            total,
            total_pages,
        }
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }
}
