//! Job-file configuration for the command-line runner.
//!
//! A job file is a TOML document naming one recipe plus its inputs. The
//! geometry can be inline or pulled from a file, like every other
//! long-form field.

use std::{fmt::Debug, fs::read_to_string, path::Path};

use descent::Direction;
use engines::tblite::Method;
use matter::Structure;
use serde::{Deserialize, Serialize};

use crate::{
    OptSwaps, Params, RecipeError,
    recipes::{self, VibSwaps, orca::OrcaOpts},
    settings::{self, Settings},
};

/// Geometries can either be literal coordinate blocks in the job file, or
/// the name of an XYZ file to be loaded
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(untagged)]
enum GeometrySrc {
    Literal(String),
    File { file: String },
}

impl From<GeometrySrc> for String {
    fn from(value: GeometrySrc) -> Self {
        match value {
            GeometrySrc::Literal(s) => s,
            GeometrySrc::File { file } => read_to_string(&file)
                .unwrap_or_else(|_| {
                    panic!("failed to locate geometry file {file}")
                }),
        }
    }
}

/// every job the runner can dispatch, named `engine.job`
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Recipe {
    #[serde(rename = "emt.static")]
    EmtStatic,
    #[serde(rename = "emt.relax")]
    EmtRelax,
    #[serde(rename = "lj.static")]
    LjStatic,
    #[serde(rename = "lj.relax")]
    LjRelax,
    #[serde(rename = "lj.ts")]
    LjTs,
    #[serde(rename = "lj.irc")]
    LjIrc,
    #[serde(rename = "lj.quasi_irc")]
    LjQuasiIrc,
    #[serde(rename = "lj.freq")]
    LjFreq,
    #[serde(rename = "tblite.static")]
    TbliteStatic,
    #[serde(rename = "tblite.relax")]
    TbliteRelax,
    #[serde(rename = "tblite.freq")]
    TbliteFreq,
    #[serde(rename = "orca.static")]
    OrcaStatic,
    #[serde(rename = "orca.relax")]
    OrcaRelax,
    #[serde(rename = "orca.ts")]
    OrcaTs,
    #[serde(rename = "orca.irc")]
    OrcaIrc,
    #[serde(rename = "orca.quasi_irc")]
    OrcaQuasiIrc,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// which recipe to run
    recipe: Recipe,

    /// the structure to operate on, as `symbol x y z` lines with an
    /// optional XYZ header
    geometry: GeometrySrc,

    /// total molecular charge; resolved against the structure when absent
    charge: Option<isize>,

    /// spin multiplicity; resolved to the lowest consistent state when
    /// absent
    spin_multiplicity: Option<usize>,

    /// tight-binding method for the tblite recipes
    method: Option<Method>,

    /// relax the cell along with the atoms (emt.relax)
    relax_cell: Option<bool>,

    /// IRC walk direction
    direction: Option<Direction>,

    /// thermochemistry temperature in K
    temperature: Option<f64>,

    /// thermochemistry pressure in bar
    pressure: Option<f64>,

    /// electronic energy underneath the thermal corrections, eV
    energy: Option<f64>,

    /// cores for external engines; defaults to the host parallelism
    cores: Option<usize>,

    /// free-form engine keyword overrides
    calc_kwargs: Option<toml::Table>,

    opt_swaps: Option<OptSwaps>,
    irc_swaps: Option<OptSwaps>,
    relax_swaps: Option<OptSwaps>,
    vib_swaps: Option<VibSwaps>,

    /// engine selection for the orca recipes
    orca: Option<RawOrca>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
#[serde(deny_unknown_fields)]
struct RawOrca {
    method: Option<String>,
    basis: Option<String>,
    scf_algorithm: Option<String>,
    cpcm_dielectric: Option<f64>,
    smd_solvent: Option<String>,
    n_cores: Option<usize>,
    overwrite_inputs: Option<toml::Table>,
}

fn toml_to_params(table: toml::Table) -> Params {
    match serde_json::to_value(table) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => Params::new(),
    }
}

/// Construct a full [Config] with [Config::load] on a TOML job file
#[derive(Debug, PartialEq)]
pub struct Config {
    pub recipe: Recipe,
    pub geometry: Structure,
    pub charge: Option<isize>,
    pub spin_multiplicity: Option<usize>,
    pub method: Method,
    pub relax_cell: bool,
    pub direction: Direction,
    pub temperature: f64,
    pub pressure: f64,
    pub energy: f64,
    pub cores: Option<usize>,
    pub calc_kwargs: Params,
    pub opt_swaps: OptSwaps,
    pub irc_swaps: OptSwaps,
    pub relax_swaps: OptSwaps,
    pub vib_swaps: VibSwaps,
    pub orca: OrcaOpts,
}

impl From<RawConfig> for Config {
    fn from(rc: RawConfig) -> Self {
        let geometry: String = rc.geometry.into();
        let orca = rc.orca.unwrap_or_default();
        let orca_defaults = OrcaOpts::default();
        Self {
            recipe: rc.recipe,
            geometry: geometry.parse().unwrap_or_else(|e| {
                panic!("failed to parse geometry with {e}")
            }),
            charge: rc.charge,
            spin_multiplicity: rc.spin_multiplicity,
            method: rc.method.unwrap_or_default(),
            relax_cell: rc.relax_cell.unwrap_or(false),
            direction: rc.direction.unwrap_or(Direction::Forward),
            temperature: rc.temperature.unwrap_or(298.15),
            pressure: rc.pressure.unwrap_or(1.0),
            energy: rc.energy.unwrap_or(0.0),
            cores: rc.cores,
            calc_kwargs: rc
                .calc_kwargs
                .map(toml_to_params)
                .unwrap_or_default(),
            opt_swaps: rc.opt_swaps.unwrap_or_default(),
            irc_swaps: rc.irc_swaps.unwrap_or_default(),
            relax_swaps: rc.relax_swaps.unwrap_or_default(),
            vib_swaps: rc.vib_swaps.unwrap_or_default(),
            orca: OrcaOpts {
                method: orca.method.unwrap_or(orca_defaults.method),
                basis: orca.basis.unwrap_or(orca_defaults.basis),
                scf_algorithm: orca
                    .scf_algorithm
                    .unwrap_or(orca_defaults.scf_algorithm),
                cpcm_dielectric: orca.cpcm_dielectric,
                smd_solvent: orca.smd_solvent,
                n_cores: orca.n_cores,
                overwrite_inputs: orca
                    .overwrite_inputs
                    .map(toml_to_params)
                    .unwrap_or_default(),
            },
        }
    }
}

impl Config {
    /// load a [Config] from the TOML job file at `path`. panics on failure
    /// to read or deserialize, which is the right behavior for the CLI this
    /// backs
    pub fn load<P>(path: P) -> Self
    where
        P: AsRef<Path> + Debug,
    {
        let contents = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to load job file with {e}"));
        let raw: RawConfig = toml::from_str(&contents).unwrap_or_else(|e| {
            panic!("failed to deserialize job file '{path:?}' with {e}")
        });
        raw.into()
    }

    /// dispatch the configured recipe and serialize its record
    pub fn run(&self) -> Result<serde_json::Value, RecipeError> {
        if self.cores.is_some() {
            settings::set(Settings {
                cores: self.cores,
                ..settings::current()
            });
        }
        let geom = self.geometry.clone();
        let json = |r: &dyn erased_ser::Record| r.to_value();
        // a hand-rolled dispatch keeps every combination visible in one
        // place
        let value = match self.recipe {
            Recipe::EmtStatic => json(&recipes::emt::static_job(
                geom,
                &self.calc_kwargs,
            )?),
            Recipe::EmtRelax => json(&recipes::emt::relax_job(
                geom,
                self.relax_cell,
                &self.calc_kwargs,
                &self.opt_swaps,
            )?),
            Recipe::LjStatic => json(&recipes::lj::static_job(
                geom,
                &self.calc_kwargs,
            )?),
            Recipe::LjRelax => json(&recipes::lj::relax_job(
                geom,
                &self.calc_kwargs,
                &self.opt_swaps,
            )?),
            Recipe::LjTs => json(&recipes::lj::ts_job(
                geom,
                &self.calc_kwargs,
                &self.opt_swaps,
            )?),
            Recipe::LjIrc => json(&recipes::lj::irc_job(
                geom,
                self.direction,
                &self.calc_kwargs,
                &self.opt_swaps,
            )?),
            Recipe::LjQuasiIrc => json(&recipes::lj::quasi_irc_job(
                geom,
                self.direction,
                &self.calc_kwargs,
                &self.irc_swaps,
                &self.relax_swaps,
            )?),
            Recipe::LjFreq => json(&recipes::lj::freq_job(
                geom,
                self.energy,
                self.temperature,
                self.pressure,
                &self.calc_kwargs,
                &self.vib_swaps,
            )?),
            Recipe::TbliteStatic => json(&recipes::tblite::static_job(
                geom,
                self.method,
                self.charge,
                self.spin_multiplicity,
                &self.calc_kwargs,
            )?),
            Recipe::TbliteRelax => json(&recipes::tblite::relax_job(
                geom,
                self.method,
                self.charge,
                self.spin_multiplicity,
                &self.calc_kwargs,
                &self.opt_swaps,
            )?),
            Recipe::TbliteFreq => json(&recipes::tblite::freq_job(
                geom,
                self.method,
                self.energy,
                self.temperature,
                self.pressure,
                self.charge,
                self.spin_multiplicity,
                &self.calc_kwargs,
                &self.vib_swaps,
            )?),
            Recipe::OrcaStatic => json(&recipes::orca::static_job(
                geom,
                self.charge,
                self.spin_multiplicity,
                &self.orca,
            )?),
            Recipe::OrcaRelax => json(&recipes::orca::relax_job(
                geom,
                self.charge,
                self.spin_multiplicity,
                &self.orca,
                &self.opt_swaps,
            )?),
            Recipe::OrcaTs => json(&recipes::orca::ts_job(
                geom,
                self.charge,
                self.spin_multiplicity,
                &self.orca,
                &self.opt_swaps,
            )?),
            Recipe::OrcaIrc => json(&recipes::orca::irc_job(
                geom,
                self.direction,
                self.charge,
                self.spin_multiplicity,
                &self.orca,
                &self.opt_swaps,
            )?),
            Recipe::OrcaQuasiIrc => json(&recipes::orca::quasi_irc_job(
                geom,
                self.direction,
                self.charge,
                self.spin_multiplicity,
                &self.orca,
                &self.irc_swaps,
                &self.relax_swaps,
            )?),
        };
        Ok(value)
    }
}

/// object-safe serialization shim for the heterogeneous record types
mod erased_ser {
    use serde::Serialize;

    pub trait Record {
        fn to_value(&self) -> serde_json::Value;
    }

    impl<T: Serialize> Record for T {
        fn to_value(&self) -> serde_json::Value {
            serde_json::to_value(self).expect("records serialize")
        }
    }
}
