//! Fallible one-to-one transformation of a lazy sequence.

/// Iterator adapter applying `f` to every `Ok` element, in order.
///
/// The first error, from upstream or from `f`, is yielded once and ends the
/// sequence: nothing after it is pulled, nothing is skipped.
///
/// Created by [`SequenceExt::try_map`](super::SequenceExt::try_map).
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct TryMap<I, F> {
    upstream: I,
    f: F,
    finished: bool,
}

impl<I, F> TryMap<I, F> {
    pub fn new(upstream: I, f: F) -> Self {
        Self {
            upstream,
            f,
            finished: false,
        }
    }
}

impl<I, F, T, B, E> Iterator for TryMap<I, F>
where
    I: Iterator<Item = Result<T, E>>,
    F: FnMut(T) -> Result<B, E>,
{
    type Item = Result<B, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let item = match self.upstream.next()? {
            Ok(value) => (self.f)(value),
            Err(e) => Err(e),
        };
        if item.is_err() {
            self.finished = true;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, self.upstream.size_hint().1)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::sequence::SequenceExt;

    #[test]
    fn test_preserves_order_and_cardinality() {
        let input: Vec<i64> = (0..25).collect();
        let out: Vec<i64> = input
            .iter()
            .map(|v| Ok::<_, String>(*v))
            .try_map(|v| Ok(v * v - 1))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(out.len(), input.len());
        for (i, v) in out.iter().enumerate() {
            assert_eq!(*v, input[i] * input[i] - 1);
        }
    }

    #[test]
    fn test_empty_in_empty_out() {
        let out: Vec<Result<i32, String>> = std::iter::empty::<Result<i32, String>>()
            .try_map(|v| Ok(v + 1))
            .collect();
        assert!(out.is_empty());
    }

    #[test]
    fn test_failure_stops_pulling() {
        let mut pulled = 0;
        let mut calls = Vec::new();
        let out: Vec<_> = (1..=5)
            .map(Ok::<i32, String>)
            .inspect(|_| pulled += 1)
            .try_map(|v| {
                calls.push(v);
                if v == 2 {
                    Err(format!("bad element {}", v))
                } else {
                    Ok(v * 10)
                }
            })
            .collect();

        assert_eq!(out, vec![Ok(10), Err("bad element 2".to_string())]);
        assert_eq!(calls, vec![1, 2]);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_upstream_error_is_passed_through_once() {
        let rows = vec![Ok(1), Err("eof".to_string()), Ok(3)];
        let mut mapped = rows.into_iter().try_map(|v: i32| Ok(v + 1));

        assert_eq!(mapped.next(), Some(Ok(2)));
        assert_eq!(mapped.next(), Some(Err("eof".to_string())));
        assert_eq!(mapped.next(), None);
        assert_eq!(mapped.next(), None);
    }
}
