//! Index types. See [`::index_vec`].

pub use index_vec::{Idx, IndexSlice, IndexVec, index_vec};

/// Creates a new index to use with [`::index_vec`].
#[macro_export]
macro_rules! newtype_index {
    () => {};
    ($(#[$attr:meta])* $vis:vis struct $name:ident; $($rest:tt)*) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name(std::num::NonZero<u32>);

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.get())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.get())
            }
        }

        impl $crate::index::Idx for $name {
            #[inline(always)]
            fn from_usize(value: usize) -> Self {
                let value = u32::try_from(value).expect("index overflowed");
                Self::new(value)
            }

            #[inline(always)]
            fn index(self) -> usize {
                self.get() as usize
            }
        }

        impl $name {
            /// Creates a new `$name` from the given `value`.
            #[inline(always)]
            $vis const fn new(value: u32) -> Self {
                let inner_repr = value.checked_add(1).expect("index overflowed");
                Self(std::num::NonZero::new(inner_repr).expect("inner_repr should never be zero"))
            }

            /// Gets the underlying index value.
            #[inline(always)]
            $vis const fn get(self) -> u32 {
                self.0.get() - 1
            }
        }

        $crate::newtype_index!($($rest)*);
    };
}

newtype_index! {
    /// Variable (parameter or `let` binding) of a code fragment.
    pub struct VarId;
    /// Word of a packed table, counted from the table base.
    pub struct SegmentId;
    /// Interned constant within one generation run.
    pub struct ConstId;
}

/// Insertion ordered set backed by an [`IndexVec`]. Lookups are linear, which is fine for the
/// handful of distinct values a generation run produces.
pub struct IndexLinearSet<I: Idx, V: PartialEq> {
    inner: IndexVec<I, V>,
}

impl<I: Idx, V: PartialEq> IndexLinearSet<I, V> {
    pub fn new() -> Self {
        Self { inner: IndexVec::new() }
    }

    /// Adds `value`, returning its new index, or `Err` with the index of the equal value already
    /// in the set.
    pub fn add(&mut self, value: V) -> Result<I, I> {
        self.find(&value).map_or(Ok(()), |i| Err(i))?;
        let new_id = self.inner.len_idx();
        self.inner.push(value);
        Ok(new_id)
    }

    pub fn find(&self, value: &V) -> Option<I> {
        self.inner.position(|member| member == value)
    }
}

impl<I: Idx, V: PartialEq> Default for IndexLinearSet<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, V: PartialEq> std::ops::Deref for IndexLinearSet<I, V> {
    type Target = IndexVec<I, V>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
