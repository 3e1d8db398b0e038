const DEFAULT_PAGE_SIZE: i64 = 6;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(serde::Deserialize, Debug, Default, Clone, Copy)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Self {
            number: query.page.unwrap_or(1).max(1),
            size: query
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

#[derive(serde::Serialize, Debug)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: i64, page: Page) -> Self {
        let next = (page.offset().saturating_add(page.size) < count)
            .then_some(page.number + 1);
        let previous = (page.number > 1).then_some(page.number - 1);
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}
