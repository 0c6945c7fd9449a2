//! Execution listing DTOs

use serde::{Deserialize, Serialize};

/// `limit`/`offset` pagination of the execution listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl Page {
    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page() {
        let page = Page::default().next();
        assert_eq!(page, Page { limit: 20, offset: 20 });
    }

    #[test]
    fn test_next_page_saturates() {
        let page = Page {
            limit: 50,
            offset: u32::MAX - 10,
        };
        assert_eq!(page.next().offset, u32::MAX);
    }
}
