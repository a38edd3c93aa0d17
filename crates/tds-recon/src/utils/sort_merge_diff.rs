use std::cmp::Ordering;
use std::iter::Peekable;

#[derive(Debug, PartialEq, Eq)]
pub enum JoinResult<A, B> {
    OnlyInFirst(A),
    OnlyInSecond(B),
    InBoth(A, B),
}

/// Merges two iterators that are sorted by the same key, pairing up items with equal keys.
///
/// Both inputs must be sorted ascending according to `cmp` and must not contain
/// duplicate keys (group duplicates beforehand).
pub struct SortMergeDiff<I: Iterator, J: Iterator, F> {
    first: Peekable<I>,
    second: Peekable<J>,
    cmp: F,
}

impl<I, J, F> SortMergeDiff<I, J, F>
where
    I: Iterator,
    J: Iterator,
    F: FnMut(&I::Item, &J::Item) -> Ordering,
{
    pub fn new(first: I, second: J, cmp: F) -> Self {
        SortMergeDiff {
            first: first.peekable(),
            second: second.peekable(),
            cmp,
        }
    }
}

impl<I, J, F> Iterator for SortMergeDiff<I, J, F>
where
    I: Iterator,
    J: Iterator,
    F: FnMut(&I::Item, &J::Item) -> Ordering,
{
    type Item = JoinResult<I::Item, J::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let ordering = match (self.first.peek(), self.second.peek()) {
            (None, None) => return None,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => (self.cmp)(a, b),
        };

        Some(match ordering {
            Ordering::Less => JoinResult::OnlyInFirst(self.first.next()?),
            Ordering::Greater => JoinResult::OnlyInSecond(self.second.next()?),
            Ordering::Equal => JoinResult::InBoth(self.first.next()?, self.second.next()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_interleaved_keys() {
        let first = [1, 3, 4, 7];
        let second = [2, 3, 7, 9];
        let merged: Vec<_> =
            SortMergeDiff::new(first.into_iter(), second.into_iter(), |a, b| a.cmp(b)).collect();

        assert_eq!(
            merged,
            vec![
                JoinResult::OnlyInFirst(1),
                JoinResult::OnlyInSecond(2),
                JoinResult::InBoth(3, 3),
                JoinResult::OnlyInFirst(4),
                JoinResult::InBoth(7, 7),
                JoinResult::OnlyInSecond(9),
            ]
        );
    }

    #[test]
    fn drains_longer_side() {
        let merged: Vec<_> =
            SortMergeDiff::new(std::iter::empty::<i32>(), [5, 6].into_iter(), |a, b| a.cmp(b))
                .collect();

        assert_eq!(
            merged,
            vec![JoinResult::OnlyInSecond(5), JoinResult::OnlyInSecond(6)]
        );
    }
}
