//! The structure-or-record input accepted by every recipe.
//!
//! A closed tagged union instead of shape-sniffing: a recipe takes either a
//! bare structure or the record of a previous stage, and one explicit unwrap
//! step yields the structure to operate on. Chaining stages is just passing
//! the previous record along.

use matter::Structure;

use crate::schema::{OptRecord, RunRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Structure(Structure),
    Record(Box<RunRecord>),
}

impl From<Structure> for Input {
    fn from(s: Structure) -> Self {
        Input::Structure(s)
    }
}

impl From<RunRecord> for Input {
    fn from(r: RunRecord) -> Self {
        Input::Record(Box::new(r))
    }
}

impl From<OptRecord> for Input {
    fn from(r: OptRecord) -> Self {
        Input::Record(Box::new(r.run))
    }
}

impl Input {
    /// the one unwrap step: a record input contributes its final structure
    pub fn into_structure(self) -> Structure {
        match self {
            Input::Structure(s) => s,
            Input::Record(r) => r.structure,
        }
    }
}

#[cfg(test)]
mod tests {
    use matter::Atom;

    use super::*;

    #[test]
    fn structure_passes_through() {
        let s = Structure::new(vec![Atom::new(1, 0.0, 0.0, 0.0)]);
        let got = Input::from(s.clone()).into_structure();
        assert_eq!(got, s);
    }
}
