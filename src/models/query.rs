use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Raw pagination parameters as they arrive from a caller.
///
/// Nothing is clamped: [`ListQuery::validate`] rejects out-of-range values
/// so the store is never queried with them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    pub fn validate(&self) -> Result<PageRequest, String> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err("page must be at least 1".to_string());
        }

        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {}", MAX_PAGE_LIMIT));
        }

        let sort = match self.sort.as_deref() {
            None => SortField::UpdatedAt,
            Some(s) => SortField::from_str(s).ok_or_else(|| format!("cannot sort by '{}'", s))?,
        };

        let direction = match self.order.as_deref() {
            None => SortDirection::Desc,
            Some(s) => SortDirection::from_str(s)
                .ok_or_else(|| format!("sort order must be 'asc' or 'desc', got '{}'", s))?,
        };

        Ok(PageRequest {
            page,
            limit,
            sort,
            direction,
        })
    }
}

/// Validated pagination and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl PageRequest {
    /// Rows before this page. Wide enough for any `page` a caller can send.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort: SortField::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    CreatedAt,
    UpdatedAt,
    Version,
}

impl SortField {
    /// Column name in the designs table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Version => "version",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "updatedAt" | "updated_at" => Some(Self::UpdatedAt),
            "version" => Some(Self::Version),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// One page of results plus the total the filter matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let req = ListQuery::default().validate().unwrap();
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn rejects_page_zero() {
        let query = ListQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn rejects_limit_outside_range() {
        for limit in [0, 101] {
            let query = ListQuery {
                limit: Some(limit),
                ..Default::default()
            };
            assert!(query.validate().is_err(), "limit {} accepted", limit);
        }
    }

    #[test]
    fn accepts_limit_bounds() {
        for limit in [1, 100] {
            let query = ListQuery {
                limit: Some(limit),
                ..Default::default()
            };
            assert_eq!(query.validate().unwrap().limit, limit);
        }
    }

    #[test]
    fn rejects_unknown_sort_order_and_field() {
        let bad_order = ListQuery {
            order: Some("up".to_string()),
            ..Default::default()
        };
        assert!(bad_order.validate().is_err());

        let bad_field = ListQuery {
            sort: Some("owner_id; DROP TABLE designs".to_string()),
            ..Default::default()
        };
        assert!(bad_field.validate().is_err());
    }

    #[test]
    fn skip_is_derived_from_page_and_limit() {
        let req = ListQuery {
            page: Some(3),
            limit: Some(10),
            sort: Some("name".to_string()),
            order: Some("asc".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(req.skip(), 20);
        assert_eq!(req.sort, SortField::Name);
        assert_eq!(req.direction, SortDirection::Asc);
    }

    #[test]
    fn skip_does_not_overflow_for_huge_pages() {
        let req = ListQuery {
            page: Some(u32::MAX),
            limit: Some(MAX_PAGE_LIMIT),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(req.skip(), (u64::from(u32::MAX) - 1) * u64::from(MAX_PAGE_LIMIT));
    }
}
