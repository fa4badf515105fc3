//! Operation synthesis over a planned table layout.
//!
//! Every fragment is derived from the geometry alone, with the exception of `create`, which also
//! needs the layout to know which values to pack. Keys taken by the fragments are reduced
//! positions, not raw selectors.
//!
//! Parameter conventions per location:
//! - [`TableLocation::Word`]: the table is a value, `read(word, key)` and
//!   `write(word, key, value)` return the (new) word.
//! - [`ArrayLocation::Memory`]: `base` is the memory pointer of the first word.
//! - [`ArrayLocation::Storage`]: `base` is the storage slot of the first word.

mod create;
mod goto;
mod read;
mod write;

use dispatch_data::{
    ArrayLocation, Expr, Fragment, FragmentBuilder, Result, TableLayout, TableLocation,
    WordGeometry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Clears the destination element before merging the new value in.
    Safe,
    /// Merges the new value into whatever the destination element holds. Only equivalent to
    /// [`WriteMode::Safe`] when the element was zero.
    Unsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GotoMode {
    /// Jumps to the decoded element.
    Always,
    /// Jumps to the decoded element when it is nonzero, otherwise falls through yielding `0`.
    IfExists,
}

/// The fragments generated for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBundle {
    pub create: Fragment,
    pub read: Fragment,
    pub write: Fragment,
    pub write_unsafe: Fragment,
    pub goto: Option<Fragment>,
    pub goto_if_exists: Option<Fragment>,
}

impl OperationBundle {
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        [&self.create, &self.read, &self.write, &self.write_unsafe]
            .into_iter()
            .chain(self.goto.as_ref())
            .chain(self.goto_if_exists.as_ref())
    }
}

/// Where the fragment finds the word holding the element and how to write it back.
enum Place {
    Value,
    Memory { addr: Expr },
    Storage { slot: Expr },
}

/// The word an element lives in, the right shift bringing it down to the low bits and the place
/// the word is stored at.
struct Element {
    word: Expr,
    shift: Expr,
    place: Place,
}

#[derive(Debug, Clone, Copy)]
pub struct OperationSynthesizer {
    geometry: WordGeometry,
    location: TableLocation,
}

impl OperationSynthesizer {
    /// Memory tables are byte addressed and need elements that never straddle a word.
    pub fn new(geometry: WordGeometry, location: TableLocation) -> Result<Self> {
        if location == TableLocation::Array(ArrayLocation::Memory) {
            geometry.require_multi_segment()?;
        }
        Ok(Self { geometry, location })
    }

    pub fn geometry(&self) -> WordGeometry {
        self.geometry
    }

    pub fn location(&self) -> TableLocation {
        self.location
    }

    /// All fragments for `layout`, named `{prefix}_{operation}`. Goto fragments are only
    /// generated when `with_goto` is set.
    pub fn bundle(
        &self,
        prefix: &str,
        layout: &TableLayout,
        with_goto: bool,
    ) -> Result<OperationBundle> {
        let (goto, goto_if_exists) = if with_goto {
            (
                Some(self.goto(&format!("{prefix}_goto"), GotoMode::Always)?),
                Some(self.goto(&format!("{prefix}_goto_if_exists"), GotoMode::IfExists)?),
            )
        } else {
            (None, None)
        };
        Ok(OperationBundle {
            create: self.create(&format!("{prefix}_create"), layout)?,
            read: self.read(&format!("{prefix}_read")),
            write: self.write(&format!("{prefix}_write"), WriteMode::Safe),
            write_unsafe: self.write(&format!("{prefix}_write_unsafe"), WriteMode::Unsafe),
            goto,
            goto_if_exists,
        })
    }

    fn mask(&self) -> Expr {
        Expr::Const(self.geometry.element_mask())
    }

    /// Declares the table and key parameters and addresses the element `key` selects. Writing
    /// fragments reuse the address and shift, so those get bound to variables.
    fn element(&self, builder: &mut FragmentBuilder, writes: bool) -> Element {
        let table = builder.param(match self.location {
            TableLocation::Word => "word",
            TableLocation::Array(_) => "base",
        });
        let key = Expr::Var(builder.param("key"));
        let bind = |builder: &mut FragmentBuilder, name: &str, value: Expr| {
            if writes && value.as_const().is_none() {
                Expr::Var(builder.bind(name, value))
            } else {
                value
            }
        };

        match self.location {
            TableLocation::Word => {
                let shift = bind(builder, "shift", self.geometry.bits_from_right_expr(key));
                Element { word: Expr::Var(table), shift, place: Place::Value }
            }
            TableLocation::Array(ArrayLocation::Memory) => {
                let offset = self.geometry.byte_offset_expr(key, ArrayLocation::Memory);
                let addr = bind(builder, "addr", Expr::add(Expr::Var(table), offset));
                Element {
                    word: Expr::mload(addr.clone()),
                    shift: Expr::konst(u64::from(self.geometry.top_aligned_shift())),
                    place: Place::Memory { addr },
                }
            }
            TableLocation::Array(ArrayLocation::Storage) => {
                let per_word = Expr::konst(u64::from(self.geometry.elements_per_word()));
                let offset = self.geometry.byte_offset_expr(key.clone(), ArrayLocation::Storage);
                let slot = bind(builder, "slot", Expr::add(Expr::Var(table), offset));
                let shift = bind(
                    builder,
                    "shift",
                    self.geometry.bits_from_right_expr(Expr::rem(key, per_word)),
                );
                Element { word: Expr::sload(slot.clone()), shift, place: Place::Storage { slot } }
            }
        }
    }

    /// The element of `element`, right aligned and masked.
    fn extract(&self, element: &Element) -> Expr {
        let shifted = Expr::shr(element.shift.clone(), element.word.clone());
        // Shifting the top element down already clears everything above it.
        if element.shift.as_const() == Some(self.top_aligned_shift()) {
            return shifted;
        }
        Expr::and(shifted, self.mask())
    }

    fn top_aligned_shift(&self) -> alloy_primitives::U256 {
        alloy_primitives::U256::from(self.geometry.top_aligned_shift())
    }
}
