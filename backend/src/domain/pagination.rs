//! Cursor pagination over already-filtered record lists.

use shared::{ListQuery, ListResponse, PaginationInfo};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Slice `records` according to `query`.
///
/// The cursor is the ID of the last record of the previous page; an unknown
/// cursor yields an empty page rather than restarting from the top.
pub fn paginate<T, F>(records: Vec<T>, query: &ListQuery, id_of: F) -> ListResponse<T>
where
    F: Fn(&T) -> &str,
{
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;

    let start = match &query.after {
        Some(cursor) => records
            .iter()
            .position(|record| id_of(record) == cursor.as_str())
            .map(|index| index + 1)
            .unwrap_or(records.len()),
        None => 0,
    };

    // Take one extra record to learn whether another page exists
    let mut page: Vec<T> = records.into_iter().skip(start).take(limit + 1).collect();
    let has_more = page.len() > limit;
    if has_more {
        page.truncate(limit);
    }

    let next_cursor = if has_more {
        page.last().map(|record| id_of(record).to_string())
    } else {
        None
    };

    ListResponse {
        items: page,
        pagination: PaginationInfo { has_more, next_cursor },
    }
}
