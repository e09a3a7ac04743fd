//! Collection-level workflow rules: priority assignment for newly estimated
//! requests, the stable ordering of prioritized lists, and adjacent-swap
//! reordering.

use crate::domain::request::{Request, RequestId, RequestStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReorderDirection {
    Up,
    Down,
}

/// Priority slot for a request entering the estimated list: one past the
/// highest value among currently active prioritized requests. Finished and
/// archived requests are ignored, so values are only locally comparable, not
/// globally unique over history.
pub fn next_priority(requests: &[Request]) -> u32 {
    requests
        .iter()
        .filter(|request| request.is_active_prioritized())
        .filter_map(|request| request.priority)
        .max()
        .unwrap_or(0)
        + 1
}

/// Requests in the given status, sorted for display. Priority is the primary
/// key; ties (possible after deletions, since values are never renumbered)
/// fall back to submission time and then id, keeping the order total and
/// stable.
pub fn prioritized(requests: &[Request], status: RequestStatus) -> Vec<&Request> {
    let mut selected: Vec<&Request> =
        requests.iter().filter(|request| request.status == status).collect();
    selected.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    selected
}

fn sort_key(request: &Request) -> (u32, chrono::DateTime<chrono::Utc>, &str) {
    (request.priority.unwrap_or(u32::MAX), request.created_at, request.id.0.as_str())
}

/// Swaps the priority of an estimated request with its neighbour in the
/// priority-sorted estimated list. Exactly two values move; the list is never
/// renumbered. Moving the first item up or the last item down is a no-op, as
/// is naming a request that is not in the estimated list. Returns the ids of
/// the two requests whose priorities changed, so callers can persist both.
pub fn reorder(
    requests: &mut [Request],
    id: &RequestId,
    direction: ReorderDirection,
) -> Option<(RequestId, RequestId)> {
    let mut order: Vec<usize> = (0..requests.len())
        .filter(|&index| requests[index].status == RequestStatus::Estimated)
        .collect();
    order.sort_by(|&a, &b| sort_key(&requests[a]).cmp(&sort_key(&requests[b])));

    let position = order.iter().position(|&index| &requests[index].id == id)?;

    let neighbour = match direction {
        ReorderDirection::Up if position > 0 => order[position - 1],
        ReorderDirection::Down if position + 1 < order.len() => order[position + 1],
        _ => return None,
    };

    let current = order[position];
    let swapped = requests[current].priority;
    requests[current].priority = requests[neighbour].priority;
    requests[neighbour].priority = swapped;
    Some((requests[current].id.clone(), requests[neighbour].id.clone()))
}
