//! Splitting ordered items into bounded chunks.

use std::iter::FusedIterator;

/// Split `items` into chunks of at most `max_size` items, preserving order.
///
/// With `max_size` of `None` (or `Some(0)`) everything is emitted as a
/// single chunk, even when there are no items. Otherwise every chunk holds
/// exactly `max_size` items except possibly the last, and empty input
/// yields no chunks.
pub fn chunks<I>(items: I, max_size: Option<usize>) -> Chunks<I::IntoIter>
where
    I: IntoIterator,
{
    Chunks {
        iter: items.into_iter(),
        max_size: max_size.filter(|&n| n > 0),
        done: false,
    }
}

/// Lazy, single-pass iterator returned by [`chunks`].
#[derive(Debug)]
pub struct Chunks<I> {
    iter: I,
    max_size: Option<usize>,
    done: bool,
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.max_size {
            None => {
                self.done = true;
                Some(self.iter.by_ref().collect())
            }
            Some(n) => {
                let chunk: Vec<_> = self.iter.by_ref().take(n).collect();
                if chunk.is_empty() {
                    self.done = true;
                    None
                } else {
                    Some(chunk)
                }
            }
        }
    }
}

impl<I: Iterator> FusedIterator for Chunks<I> {}
