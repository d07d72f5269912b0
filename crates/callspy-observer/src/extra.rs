//! The per-call extras list.

use std::fmt;
use std::slice;

use callspy_core::{Encodable, Observations};

/// One stored entry in an observer's extras list.
///
/// The observer's own observations record is stored as a placeholder and
/// resolved on access, so the list never borrows from the observer itself.
#[derive(Clone, Copy)]
pub(crate) enum Extra<'call> {
    /// The observer's observations record.
    Observations,
    /// A caller-supplied extra borrowed for the call.
    External(&'call dyn Encodable),
}

/// A resolved entry of the extras list, in attachment order.
#[derive(Clone, Copy)]
pub enum ExtraRef<'a> {
    /// The call's observations record.
    Observations(&'a Observations),
    /// An extra attached with
    /// [`CallObserver::add_extra`](crate::CallObserver::add_extra).
    External(&'a dyn Encodable),
}

impl<'a> ExtraRef<'a> {
    /// View this entry through the encodable capability.
    pub fn as_encodable(&self) -> &'a dyn Encodable {
        match *self {
            Self::Observations(record) => record,
            Self::External(extra) => extra,
        }
    }

    /// The observations record, if this entry is it.
    pub fn as_observations(&self) -> Option<&'a Observations> {
        match *self {
            Self::Observations(record) => Some(record),
            Self::External(_) => None,
        }
    }
}

/// Iterator over an observer's extras, returned by
/// [`CallObserver::extras`](crate::CallObserver::extras).
#[derive(Clone)]
pub struct Extras<'a, 'call> {
    entries: slice::Iter<'a, Extra<'call>>,
    observations: Option<&'a Observations>,
}

impl<'a, 'call> Extras<'a, 'call> {
    pub(crate) fn new(entries: &'a [Extra<'call>], observations: Option<&'a Observations>) -> Self {
        Self {
            entries: entries.iter(),
            observations,
        }
    }
}

impl<'a, 'call: 'a> Iterator for Extras<'a, 'call> {
    type Item = ExtraRef<'a>;

    fn next(&mut self) -> Option<ExtraRef<'a>> {
        loop {
            match *self.entries.next()? {
                Extra::External(extra) => return Some(ExtraRef::External(extra)),
                // The placeholder is only pushed alongside the record.
                Extra::Observations => {
                    if let Some(record) = self.observations {
                        return Some(ExtraRef::Observations(record));
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

impl fmt::Debug for ExtraRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observations(record) => f.debug_tuple("Observations").field(record).finish(),
            Self::External(extra) => f
                .debug_struct("External")
                .field("type_tag", &extra.type_tag())
                .finish(),
        }
    }
}
