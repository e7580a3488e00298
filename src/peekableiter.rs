// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::VecDeque;

/// An iterator adapter that allows looking ahead up to `max_peek` items.
pub struct PeekableIter<'a, T> {
    upstream: &'a mut dyn Iterator<Item = T>,
    buffer: VecDeque<T>,
    max_peek: usize,
}

impl<'a, T> PeekableIter<'a, T> {
    pub fn new(upstream: &'a mut dyn Iterator<Item = T>, max_peek: usize) -> Self {
        let mut buffer = VecDeque::with_capacity(max_peek);
        for _ in 0..max_peek {
            match upstream.next() {
                Some(item) => buffer.push_back(item),
                None => break,
            }
        }

        Self {
            upstream,
            buffer,
            max_peek,
        }
    }

    /// Look at the item `offset` positions ahead without consuming it.
    ///
    /// Offsets at or beyond `max_peek` are a programming error.
    pub fn peek(&self, offset: usize) -> Option<&T> {
        assert!(
            offset < self.max_peek,
            "peek offset {} exceeds the maximum of {}",
            offset,
            self.max_peek
        );

        self.buffer.get(offset)
    }
}

impl<T> Iterator for PeekableIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.pop_front()?;
        if let Some(following) = self.upstream.next() {
            self.buffer.push_back(following);
        }
        Some(item)
    }
}
