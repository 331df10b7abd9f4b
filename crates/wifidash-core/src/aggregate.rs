//! Folding of flat rows into per-key entity builders.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use crate::error::CoreResult;
use crate::row::{Row, Scalar};

/// A typed accumulator for one domain entity.
///
/// The folder calls [`EntityBuilder::seed`] the first time a key is seen,
/// [`EntityBuilder::apply`] for every row of that key (including the first),
/// and [`EntityBuilder::finish`] once all rows are consumed.
pub trait EntityBuilder: Sized {
    type Key: Eq + Hash + Clone + Debug;
    type Output;

    /// Rows of any other measurement are ignored by the folder.
    const MEASUREMENT: &'static str;

    /// Grouping key of a row; `Ok(None)` skips the row.
    fn key(row: &Row) -> CoreResult<Option<Self::Key>>;

    fn seed(key: &Self::Key, row: &Row) -> Self;

    /// Record `row.field = row.value`. Later rows overwrite earlier ones and
    /// unknown fields are ignored.
    fn apply(&mut self, row: &Row);

    fn finish(self) -> CoreResult<Self::Output>;
}

/// Insertion-ordered map of key to builder.
pub struct Folder<B: EntityBuilder> {
    order: Vec<(B::Key, B)>,
    index: HashMap<B::Key, usize>,
}

impl<B: EntityBuilder> Default for Folder<B> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<B: EntityBuilder> Folder<B> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: B::Key, row: &Row) -> &mut B {
        let idx = match self.index.get(&key) {
            Some(idx) => *idx,
            None => {
                let builder = B::seed(&key, row);
                self.order.push((key.clone(), builder));
                self.index.insert(key, self.order.len() - 1);
                self.order.len() - 1
            }
        };
        &mut self.order[idx].1
    }

    /// Fold one row into its builder.
    pub fn push(&mut self, row: &Row) -> CoreResult<()> {
        if row.measurement != B::MEASUREMENT {
            return Ok(());
        }
        match B::key(row)? {
            Some(key) => self.slot(key, row).apply(row),
            None => debug!(
                measurement = B::MEASUREMENT,
                field = %row.field,
                "skipping row without grouping key"
            ),
        }
        Ok(())
    }

    pub fn extend<'a>(&mut self, rows: impl IntoIterator<Item = &'a Row>) -> CoreResult<()> {
        for row in rows {
            self.push(row)?;
        }
        Ok(())
    }

    pub fn get_mut(&mut self, key: &B::Key) -> Option<&mut B> {
        let idx = *self.index.get(key)?;
        Some(&mut self.order[idx].1)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Builders in first-seen order, without finishing them.
    pub fn into_builders(self) -> impl Iterator<Item = (B::Key, B)> {
        self.order.into_iter()
    }

    /// Finish every builder in first-seen order. The first coercion failure
    /// aborts the whole fold.
    pub fn finish(self) -> CoreResult<Vec<B::Output>> {
        self.order.into_iter().map(|(_, b)| b.finish()).collect()
    }
}

/// Fold `rows` with a fresh folder and finish it.
pub fn aggregate<B: EntityBuilder>(rows: &[Row]) -> CoreResult<Vec<B::Output>> {
    let mut folder = Folder::<B>::new();
    folder.extend(rows)?;
    folder.finish()
}

pub(crate) fn int_field(value: Option<&Scalar>, field: &str) -> CoreResult<i64> {
    value.map_or(Ok(0), |v| v.to_i64(field))
}

pub(crate) fn float_field(value: Option<&Scalar>, field: &str) -> CoreResult<f64> {
    value.map_or(Ok(0.0), |v| v.to_f64(field))
}

pub(crate) fn text_field(value: Option<&Scalar>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), Scalar::to_text)
}
