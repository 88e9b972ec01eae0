//! Charge and spin-multiplicity resolution.
//!
//! Recipes accept an optional explicit charge and multiplicity; the effective
//! values must be consistent with the structure's electron count. Resolution
//! never mutates the structure.

use std::{error::Error, fmt::Display};

use crate::Structure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeSpinError {
    /// the requested charge strips more electrons than the structure has
    ChargeExceedsElectrons { charge: isize, available: usize },
    /// multiplicity 2S+1 is at least 1 by construction
    ZeroMultiplicity,
    /// the multiplicity parity does not match the electron count: an even
    /// number of electrons requires an odd multiplicity and vice versa
    ParityMismatch { electrons: usize, multiplicity: usize },
    /// more unpaired electrons than electrons
    TooManyUnpaired { electrons: usize, multiplicity: usize },
}

impl Display for ChargeSpinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChargeExceedsElectrons { charge, available } => write!(
                f,
                "charge of {charge} exceeds the {available} available \
                 electrons"
            ),
            Self::ZeroMultiplicity => {
                write!(f, "spin multiplicity must be at least 1")
            }
            Self::ParityMismatch {
                electrons,
                multiplicity,
            } => write!(
                f,
                "spin multiplicity of {multiplicity} is inconsistent with \
                 an electron count of {electrons}: {} electrons require an \
                 {} multiplicity",
                if electrons % 2 == 0 { "even" } else { "odd" },
                if electrons % 2 == 0 { "odd" } else { "even" },
            ),
            Self::TooManyUnpaired {
                electrons,
                multiplicity,
            } => write!(
                f,
                "spin multiplicity of {multiplicity} requires {} unpaired \
                 electrons but only {electrons} are present",
                multiplicity - 1
            ),
        }
    }
}

impl Error for ChargeSpinError {}

/// Resolve an optional explicit charge and spin multiplicity against
/// `structure`.
///
/// The charge defaults to 0 and the multiplicity to the lowest spin state
/// consistent with the resulting electron count: 1 for an even count, 2 for
/// odd. An explicit multiplicity is validated for parity against the
/// charge-adjusted electron count.
pub fn resolve_charge_spin(
    structure: &Structure,
    charge: Option<isize>,
    multiplicity: Option<usize>,
) -> Result<(isize, usize), ChargeSpinError> {
    let charge = charge.unwrap_or(0);
    let electrons = structure.electrons(charge);
    if electrons < 0 {
        return Err(ChargeSpinError::ChargeExceedsElectrons {
            charge,
            available: structure.nuclear_charge(),
        });
    }
    let electrons = electrons as usize;
    let multiplicity = match multiplicity {
        None => {
            if electrons % 2 == 0 {
                1
            } else {
                2
            }
        }
        Some(0) => return Err(ChargeSpinError::ZeroMultiplicity),
        Some(m) => {
            if (electrons + m) % 2 != 1 {
                return Err(ChargeSpinError::ParityMismatch {
                    electrons,
                    multiplicity: m,
                });
            }
            if m - 1 > electrons {
                return Err(ChargeSpinError::TooManyUnpaired {
                    electrons,
                    multiplicity: m,
                });
            }
            m
        }
    };
    Ok((charge, multiplicity))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::Atom;

    fn water() -> Structure {
        Structure::new(vec![
            Atom::new(8, 0.0, 0.0, 0.1197),
            Atom::new(1, 0.0, 0.7616, -0.4786),
            Atom::new(1, 0.0, -0.7616, -0.4786),
        ])
    }

    #[test]
    fn neutral_defaults() {
        // 10 electrons, closed shell
        assert_eq!(resolve_charge_spin(&water(), None, None), Ok((0, 1)));
    }

    #[test_case(Some(1), None, Ok((1, 2)) ; "cation defaults to doublet")]
    #[test_case(Some(-1), None, Ok((-1, 2)) ; "anion defaults to doublet")]
    #[test_case(None, Some(3), Ok((0, 3)) ; "explicit triplet is allowed")]
    #[test_case(Some(1), Some(2), Ok((1, 2)) ; "explicit doublet cation")]
    fn resolution(
        charge: Option<isize>,
        mult: Option<usize>,
        want: Result<(isize, usize), ChargeSpinError>,
    ) {
        assert_eq!(resolve_charge_spin(&water(), charge, mult), want);
    }

    #[test]
    fn parity_mismatch() {
        let got = resolve_charge_spin(&water(), None, Some(2));
        assert_eq!(
            got,
            Err(ChargeSpinError::ParityMismatch {
                electrons: 10,
                multiplicity: 2
            })
        );
        // and the message is descriptive
        let msg = got.unwrap_err().to_string();
        assert!(msg.contains("inconsistent"));
    }

    #[test]
    fn charge_bounds() {
        let h = Structure::new(vec![Atom::new(1, 0.0, 0.0, 0.0)]);
        assert!(matches!(
            resolve_charge_spin(&h, Some(2), None),
            Err(ChargeSpinError::ChargeExceedsElectrons { .. })
        ));
        assert_eq!(resolve_charge_spin(&h, Some(1), None), Ok((1, 1)));
    }

    #[test]
    fn too_many_unpaired() {
        let h2 = Structure::new(vec![
            Atom::new(1, 0.0, 0.0, 0.0),
            Atom::new(1, 0.74, 0.0, 0.0),
        ]);
        assert!(matches!(
            resolve_charge_spin(&h2, None, Some(5)),
            Err(ChargeSpinError::TooManyUnpaired { .. })
        ));
    }

    #[test]
    fn zero_multiplicity() {
        assert_eq!(
            resolve_charge_spin(&water(), None, Some(0)),
            Err(ChargeSpinError::ZeroMultiplicity)
        );
    }
}
