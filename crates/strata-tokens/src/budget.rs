/// Length of the longest prefix of `costs` whose sum stays within `budget`.
///
/// Stops at the first item that does not fit. Later, smaller items are never
/// pulled forward past a gap.
pub fn prefix_within(costs: &[usize], budget: usize) -> usize {
    let mut used = 0usize;
    for (i, cost) in costs.iter().enumerate() {
        match used.checked_add(*cost) {
            Some(total) if total <= budget => used = total,
            _ => return i,
        }
    }
    costs.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_stops_at_first_overflow() {
        assert_eq!(prefix_within(&[100, 100, 900, 10], 1000), 2);
        assert_eq!(prefix_within(&[100; 50], 1000), 10);
        assert_eq!(prefix_within(&[], 10), 0);
        assert_eq!(prefix_within(&[0, 0], 0), 2);
    }
}
