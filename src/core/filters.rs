use crate::models::{PageInfo, SwipeCandidate};

/// Check if a candidate passes the optional category filter
///
/// Exact match against the best main type; an absent or empty filter keeps everyone.
#[inline]
pub fn matches_category(candidate: &SwipeCandidate, category: Option<&str>) -> bool {
    match category {
        None => true,
        Some("") => true,
        Some(wanted) => candidate.main_type == wanted,
    }
}

/// Retain only candidates whose best main type equals `category`
pub fn filter_by_category(
    candidates: Vec<SwipeCandidate>,
    category: Option<&str>,
) -> Vec<SwipeCandidate> {
    candidates
        .into_iter()
        .filter(|c| matches_category(c, category))
        .collect()
}

/// Slice an assembled feed into a zero-based page.
///
/// Without `page` and `size` the full list is returned and no page info is produced.
pub fn paginate<T>(
    items: Vec<T>,
    page: Option<u32>,
    size: Option<u32>,
    default_size: u32,
) -> (Vec<T>, Option<PageInfo>) {
    if page.is_none() && size.is_none() {
        return (items, None);
    }

    let page = page.unwrap_or(0);
    let size = size.unwrap_or(default_size).max(1);
    let total_elements = items.len();
    let start = (page as usize).saturating_mul(size as usize);

    let slice: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(size as usize)
        .collect();

    let has_next = start.saturating_add(slice.len()) < total_elements;

    (
        slice,
        Some(PageInfo {
            page,
            size,
            total_elements,
            has_next,
        }),
    )
}
