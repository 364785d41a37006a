// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Utility for converting nested enum errors into collections of
//! static strings, so that a drop reason can be logged from the packet
//! path without allocating or paying the `fmt` tax on every layer.

use core::ffi::CStr;
use core::fmt;

pub use derror_macro::DError;

/// A trait used for walking chains of errors which store useful data in
/// a leaf node.
pub trait DError {
    /// Provide the name of an error's discriminant.
    fn discriminant(&self) -> &'static CStr;

    /// Provide a reference to the next error in the chain.
    fn child(&self) -> Option<&dyn DError>;

    /// Store data from a leaf error to be bundled with the block.
    fn leaf_data(&self, _data: &mut [u64]) {}
}

static EMPTY_STRING: &CStr = c"";

/// A flattened error trace: the names of all `enum` discriminants
/// encountered when resolving an error, plus the data from its leaf.
///
/// The block has a fixed size and is built without allocation.
#[derive(Clone, Copy, Debug)]
pub struct ErrorBlock<const L: usize> {
    len: usize,
    more: bool,
    data: [u64; 2],
    entries: [&'static CStr; L],
}

/// Signals that an [`ErrorBlock`] could not contain a new string entry.
#[derive(Clone, Copy, Debug)]
pub struct ErrorBlockFull;

impl<const L: usize> Default for ErrorBlock<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const L: usize> ErrorBlock<L> {
    /// Create storage to hold at most `L` static string entries.
    pub fn new() -> Self {
        Self { len: 0, more: false, data: [0; 2], entries: [EMPTY_STRING; L] }
    }

    /// Flatten a nested error into a static string list.
    ///
    /// This function will return an error if the provided `err` contains
    /// too many entries to include within this `ErrorBlock`; the
    /// returned block still holds the outermost `L` names.
    pub fn from_err(err: &dyn DError) -> Result<ErrorBlock<L>, ErrorBlock<L>> {
        let mut out = ErrorBlock::new();

        if out.append(err).is_err() { Err(out) } else { Ok(out) }
    }

    /// Push all layers (and data) of an error into a block.
    pub fn append(&mut self, err: &dyn DError) -> Result<(), ErrorBlockFull> {
        let mut top: Option<&dyn DError> = Some(err);
        while let Some(el) = top {
            self.append_name(el)?;
            top = el.child();

            if top.is_none() {
                el.leaf_data(&mut self.data[..]);
            }
        }
        Ok(())
    }

    /// Appends the top layer name of a given error.
    pub fn append_name(
        &mut self,
        err: &dyn DError,
    ) -> Result<(), ErrorBlockFull> {
        if self.len >= L {
            self.more = true;
            return Err(ErrorBlockFull);
        }

        self.entries[self.len] = err.discriminant();
        self.len += 1;

        Ok(())
    }

    /// Return the number of stored strings entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return whether this block contains no layer names.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return whether names were cut off for lack of space.
    pub fn truncated(&self) -> bool {
        self.more
    }

    /// Provides access to all stored [`CStr`]s.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &'static CStr> {
        self.entries[..self.len].iter().copied()
    }

    /// Provides access to data stored in a leaf error.
    pub fn data(&self) -> &[u64] {
        &self.data[..]
    }
}

/// Renders as `Outer::Inner(d0, d1)`, with a trailing `::..` when the
/// chain was cut off.
impl<const L: usize> fmt::Display for ErrorBlock<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, name) in self.entries().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{}", name.to_str().unwrap_or("?"))?;
        }
        if self.more {
            write!(f, "::..")?;
        }
        write!(f, "({}, {})", self.data[0], self.data[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    static A_C: &CStr = c"A";
    static B_C: &CStr = c"B";
    static ND_C: &CStr = c"NoData";
    static D_C: &CStr = c"Data";

    enum TestEnum {
        A,
        B(TestChildEnum),
    }

    enum TestChildEnum {
        NoData,
        Data { a: u8, b: u8 },
    }

    impl DError for TestEnum {
        fn discriminant(&self) -> &'static CStr {
            match self {
                Self::A => A_C,
                Self::B(_) => B_C,
            }
        }

        fn child(&self) -> Option<&dyn DError> {
            match self {
                Self::A => None,
                Self::B(c) => Some(c),
            }
        }
    }

    impl DError for TestChildEnum {
        fn discriminant(&self) -> &'static CStr {
            match self {
                Self::NoData => ND_C,
                Self::Data { .. } => D_C,
            }
        }

        fn child(&self) -> Option<&dyn DError> {
            None
        }

        fn leaf_data(&self, data: &mut [u64]) {
            if let Self::Data { a, b } = self {
                [data[0], data[1]] = [*a as u64, *b as u64];
            }
        }
    }

    #[test]
    fn name_and_data_storage() {
        let err = TestEnum::A;
        let block: ErrorBlock<2> = ErrorBlock::from_err(&err).unwrap();
        let mut block_iter = block.entries();
        assert_eq!(block_iter.len(), 1);
        assert_eq!(block_iter.next(), Some(A_C));
        assert_eq!(block_iter.len(), 0);
        assert_eq!(block_iter.next(), None);

        let err = TestEnum::B(TestChildEnum::NoData);
        let block: ErrorBlock<2> = ErrorBlock::from_err(&err).unwrap();
        let names = block.entries().collect::<Vec<_>>();
        assert_eq!(&names[..], &[B_C, ND_C][..]);

        let err = TestEnum::B(TestChildEnum::Data { a: 0xab, b: 0xcd });
        let block: ErrorBlock<2> = ErrorBlock::from_err(&err).unwrap();
        let names = block.entries().collect::<Vec<_>>();
        assert_eq!(&names[..], &[B_C, D_C][..]);
        assert_eq!(block.data(), &[0xab, 0xcd]);
        assert_eq!(block.to_string(), "B::Data(171, 205)");
    }

    #[test]
    fn name_truncation() {
        let err = TestEnum::B(TestChildEnum::NoData);
        let block: ErrorBlock<1> = ErrorBlock::from_err(&err).unwrap_err();
        let mut block_iter = block.entries();
        assert_eq!(block_iter.len(), 1);
        assert_eq!(block_iter.next(), Some(B_C));
        assert_eq!(block_iter.next(), None);
        assert!(block.truncated());
        assert_eq!(block.to_string(), "B::..(0, 0)");
    }

    #[derive(DError)]
    enum Derived {
        Unit,
        Nested(TestChildEnum),
        #[leaf]
        Opaque(u32),
        Pair(u8, u8),
    }

    #[derive(DError)]
    #[derror(leaf_data = DerivedLeaf::data)]
    enum DerivedLeaf {
        Code { code: u16 },
    }

    impl DerivedLeaf {
        fn data(&self, data: &mut [u64]) {
            let Self::Code { code } = self;
            data[0] = u64::from(*code);
        }
    }

    #[test]
    fn derived_chain() {
        let block: ErrorBlock<4> = ErrorBlock::from_err(&Derived::Unit).unwrap();
        assert_eq!(block.to_string(), "Unit(0, 0)");

        let err = Derived::Nested(TestChildEnum::Data { a: 1, b: 2 });
        let block: ErrorBlock<4> = ErrorBlock::from_err(&err).unwrap();
        assert_eq!(block.entries().collect::<Vec<_>>(), [c"Nested", D_C]);
        assert_eq!(block.to_string(), "Nested::Data(1, 2)");

        assert!(Derived::Opaque(7).child().is_none());
        assert!(Derived::Pair(1, 2).child().is_none());
        assert_eq!(Derived::Pair(1, 2).discriminant(), c"Pair");

        let block: ErrorBlock<4> =
            ErrorBlock::from_err(&DerivedLeaf::Code { code: 503 }).unwrap();
        assert_eq!(block.to_string(), "Code(503, 0)");
    }
}
