//! Fixed-size page arithmetic.
//!
//! These are free functions over lengths and indices so the controller, the
//! UI, and the tests all agree on one definition of a page.  None of them
//! panic: out-of-range input yields an empty slice or an unchanged index.

/// Number of pages needed for `total` items, `ceil(total / page_size)`.
///
/// Zero items is zero pages, although the active page index for an empty
/// list is still reported as 0.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// The items on page `page`, clipped to bounds.
pub fn slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(start) = page.checked_mul(page_size) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Move `delta` pages from `current`.
///
/// Returns `current` unchanged if the target falls outside `[0, page_count)`.
pub fn change_page(current: usize, delta: isize, total: usize, page_size: usize) -> usize {
    let pages = page_count(total, page_size);
    match current.checked_add_signed(delta) {
        Some(next) if next < pages => next,
        _ => current,
    }
}

/// "page N/M" text shown between the pagination buttons.
pub fn page_label(current: usize, total: usize, page_size: usize) -> String {
    let pages = page_count(total, page_size).max(1);
    format!("page {}/{}", current + 1, pages)
}
