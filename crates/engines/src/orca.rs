//! Driver for the ORCA quantum chemistry program.
//!
//! An input deck is rendered from the configured method, basis, SCF
//! algorithm, solvation, and core count, plus any caller-supplied keyword or
//! block overrides. The run requests `EnGrad`, so every evaluation yields
//! both the energy (from the log) and the gradient (from the `.engrad`
//! file).

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
    sync::OnceLock,
    time::Instant,
};

use matter::Structure;
use regex::Regex;
use serde_json::{Value, json};

use crate::{
    CalcResult, Calculator, EngineError, HARTREE_TO_EV,
    probe_executable,
    tblite::{forces_from_gradient, scratch_dir, spawn_error},
};

static CELL: OnceLock<[Regex; 2]> = OnceLock::new();

#[derive(Debug, Clone, PartialEq)]
pub struct Orca {
    pub method: String,
    pub basis: String,
    pub scf_algorithm: String,
    pub charge: isize,
    pub multiplicity: usize,
    /// dielectric constant for the polarizable-continuum model
    pub cpcm_dielectric: Option<f64>,
    /// named solvent for the SMD model
    pub smd_solvent: Option<String>,
    pub nprocs: usize,
    pub scf_max_cycles: Option<usize>,
    /// extra `!` keywords appended to the simple-input line
    pub keywords: Vec<String>,
    /// extra `% ... end` blocks appended verbatim
    pub blocks: Vec<String>,
    pub cmd: String,
    pub scratch: Option<PathBuf>,
}

impl Orca {
    pub fn new(charge: isize, multiplicity: usize) -> Self {
        Self {
            method: "wb97m-v".to_string(),
            basis: "def2-tzvpd".to_string(),
            scf_algorithm: "diis".to_string(),
            charge,
            multiplicity,
            cpcm_dielectric: None,
            smd_solvent: None,
            nprocs: 1,
            scf_max_cycles: None,
            keywords: Vec::new(),
            blocks: Vec::new(),
            cmd: "orca".to_string(),
            scratch: None,
        }
    }

    /// reject configurations the program would accept ambiguously. run
    /// before any numerical work
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.cpcm_dielectric.is_some() && self.smd_solvent.is_some() {
            return Err(EngineError::ConflictingSolvation);
        }
        Ok(())
    }

    /// apply a free-form keyword table on top of `self`; unknown keys are
    /// rejected on the engine side of the recipe contract
    pub fn apply_params(
        mut self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<Self, EngineError> {
        let bad = |k: &String| EngineError::BadKeywordValue {
            program: "orca".to_string(),
            keyword: k.clone(),
        };
        let strings = |v: &Value, k: &String| -> Result<Vec<String>, EngineError> {
            v.as_array()
                .ok_or_else(|| bad(k))?
                .iter()
                .map(|s| {
                    s.as_str().map(str::to_string).ok_or_else(|| bad(k))
                })
                .collect()
        };
        for (k, v) in params {
            match k.as_str() {
                "keywords" => self.keywords = strings(v, k)?,
                "blocks" => self.blocks = strings(v, k)?,
                "cmd" => {
                    self.cmd = v.as_str().ok_or_else(|| bad(k))?.to_string();
                }
                "scratch" => {
                    self.scratch =
                        Some(v.as_str().ok_or_else(|| bad(k))?.into());
                }
                _ => {
                    return Err(EngineError::BadKeyword {
                        program: "orca".to_string(),
                        keyword: k.clone(),
                    });
                }
            }
        }
        Ok(self)
    }

    pub(crate) fn render_input(&self, s: &Structure) -> String {
        use std::fmt::Write;
        let mut deck = format!(
            "! EnGrad {} {} {} TightSCF",
            self.method, self.basis, self.scf_algorithm
        );
        for kw in &self.keywords {
            write!(deck, " {kw}").unwrap();
        }
        deck.push('\n');
        if self.nprocs > 1 {
            writeln!(deck, "%pal\n  nprocs {}\nend", self.nprocs).unwrap();
        }
        if let Some(max) = self.scf_max_cycles {
            writeln!(deck, "%scf\n  maxiter {max}\nend").unwrap();
        }
        if let Some(eps) = self.cpcm_dielectric {
            writeln!(deck, "%cpcm\n  epsilon {eps}\nend").unwrap();
        }
        if let Some(solvent) = &self.smd_solvent {
            writeln!(deck, "%cpcm\n  smd true\n  smdsolvent \"{solvent}\"\nend")
                .unwrap();
        }
        for block in &self.blocks {
            writeln!(deck, "{block}").unwrap();
        }
        writeln!(deck, "* xyz {} {}", self.charge, self.multiplicity).unwrap();
        for a in &s.atoms {
            writeln!(
                deck,
                "{} {:.12} {:.12} {:.12}",
                a.symbol(),
                a.x,
                a.y,
                a.z
            )
            .unwrap();
        }
        deck.push_str("*\n");
        deck
    }
}

/// pull the last `FINAL SINGLE POINT ENERGY` out of an ORCA log, in Hartree
pub(crate) fn parse_output(path: &Path) -> Result<f64, EngineError> {
    let display = path.display().to_string();
    let contents = fs::read_to_string(path)
        .map_err(|e| EngineError::ReadFileError(display.clone(), e.kind()))?;
    let [error_re, energy_re] = CELL.get_or_init(|| {
        [
            Regex::new(r"(?i)ORCA finished by error|aborting the run")
                .unwrap(),
            Regex::new(r"FINAL SINGLE POINT ENERGY\s+(-?\d+\.\d+)").unwrap(),
        ]
    });
    if error_re.is_match(&contents) {
        return Err(EngineError::ErrorInOutput(display));
    }
    let energy = energy_re
        .captures_iter(&contents)
        .last()
        .and_then(|c| c[1].parse().ok())
        .ok_or(EngineError::EnergyNotFound(display))?;
    Ok(energy)
}

/// read an ORCA `.engrad` file: atom count, energy in Hartree, then the
/// flattened gradient in Hartree/Bohr
pub(crate) fn parse_engrad(
    path: &Path,
) -> Result<(usize, f64, Vec<f64>), EngineError> {
    let display = path.display().to_string();
    let contents = fs::read_to_string(path)
        .map_err(|e| EngineError::ReadFileError(display.clone(), e.kind()))?;
    let mut fields = contents
        .lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .flat_map(str::split_whitespace);
    let natoms: usize = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| EngineError::GradientNotFound(display.clone()))?;
    let energy: f64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| EngineError::EnergyNotFound(display.clone()))?;
    let gradient: Vec<f64> = fields
        .by_ref()
        .take(3 * natoms)
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| EngineError::GradientNotFound(display.clone()))?;
    if gradient.len() != 3 * natoms {
        return Err(EngineError::GradientNotFound(display));
    }
    Ok((natoms, energy, gradient))
}

impl Calculator for Orca {
    fn name(&self) -> &'static str {
        "orca"
    }

    fn parameters(&self) -> Value {
        json!({
            "method": self.method,
            "basis": self.basis,
            "scf_algorithm": self.scf_algorithm,
            "charge": self.charge,
            "spin_multiplicity": self.multiplicity,
            "cpcm_dielectric": self.cpcm_dielectric,
            "smd_solvent": self.smd_solvent,
            "nprocs": self.nprocs,
            "scf_max_cycles": self.scf_max_cycles,
            "keywords": self.keywords,
            "blocks": self.blocks,
        })
    }

    fn check_available(&self) -> Result<(), EngineError> {
        self.validate()?;
        probe_executable(
            "orca",
            &self.cmd,
            "An ORCA installation is required for DFT recipes.",
        )
    }

    fn compute(&self, structure: &Structure) -> Result<CalcResult, EngineError> {
        self.validate()?;
        let start = Instant::now();
        let (dir, _cleanup) = scratch_dir("orca", &self.scratch)?;
        let infile = dir.join("orca.inp");
        fs::write(&infile, self.render_input(structure)).map_err(|e| {
            EngineError::WriteFileError(infile.display().to_string(), e.kind())
        })?;
        log::debug!("running {} in {}", self.cmd, dir.display());
        let output = Command::new(&self.cmd)
            .arg("orca.inp")
            .current_dir(&dir)
            .output()
            .map_err(|e| spawn_error("orca", e))?;
        // orca writes its log to stdout when run directly
        let outfile = dir.join("orca.out");
        fs::write(&outfile, &output.stdout).map_err(|e| {
            EngineError::WriteFileError(outfile.display().to_string(), e.kind())
        })?;
        if !output.status.success() {
            return Err(EngineError::Failed {
                program: "orca".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        let energy = parse_output(&outfile)?;
        let (_, _, gradient) = parse_engrad(&dir.join("orca.engrad"))?;
        Ok(CalcResult {
            energy: energy * HARTREE_TO_EV,
            forces: forces_from_gradient(&gradient),
            time: start.elapsed().as_secs_f64(),
            dir: Some(dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn water() -> Structure {
        "O 0.0 0.0 0.1197
         H 0.0 0.7616 -0.4786
         H 0.0 -0.7616 -0.4786"
            .parse()
            .unwrap()
    }

    #[test]
    fn input_deck() {
        let mut orca = Orca::new(0, 1);
        orca.nprocs = 4;
        orca.cpcm_dielectric = Some(78.4);
        let got = orca.render_input(&water());
        let want = "! EnGrad wb97m-v def2-tzvpd diis TightSCF
%pal
  nprocs 4
end
%cpcm
  epsilon 78.4
end
* xyz 0 1
O 0.000000000000 0.000000000000 0.119700000000
H 0.000000000000 0.761600000000 -0.478600000000
H 0.000000000000 -0.761600000000 -0.478600000000
*
";
        assert_eq!(got, want);
    }

    #[test]
    fn smd_deck() {
        let mut orca = Orca::new(-1, 2);
        orca.smd_solvent = Some("water".to_string());
        orca.scf_algorithm = "gdm".to_string();
        orca.scf_max_cycles = Some(200);
        let got = orca.render_input(&water());
        assert!(got.contains("smdsolvent \"water\""));
        assert!(got.contains("maxiter 200"));
        assert!(got.contains("* xyz -1 2"));
    }

    #[test]
    fn conflicting_solvation() {
        let mut orca = Orca::new(0, 1);
        orca.cpcm_dielectric = Some(78.4);
        orca.smd_solvent = Some("water".to_string());
        assert_eq!(orca.validate(), Err(EngineError::ConflictingSolvation));
        assert_eq!(
            orca.compute(&water()).unwrap_err(),
            EngineError::ConflictingSolvation
        );
    }

    #[test]
    fn parse_sample_log() {
        let got = parse_output(Path::new("testfiles/h2o.out")).unwrap();
        assert_abs_diff_eq!(got, -76.272382549286, epsilon = 1e-12);
    }

    #[test]
    fn parse_sample_engrad() {
        let (natoms, energy, gradient) =
            parse_engrad(Path::new("testfiles/h2o.engrad")).unwrap();
        assert_eq!(natoms, 3);
        assert_abs_diff_eq!(energy, -76.272382549286, epsilon = 1e-12);
        assert_eq!(gradient.len(), 9);
        assert_abs_diff_eq!(gradient[2], -0.000036433, epsilon = 1e-12);
    }

    #[test]
    fn error_in_log() {
        let got = parse_output(Path::new("testfiles/aborted.out"));
        assert!(matches!(got, Err(EngineError::ErrorInOutput(_))));
    }

    #[test]
    fn unknown_keyword_rejected() {
        let mut params = serde_json::Map::new();
        params.insert("rem".to_string(), json!({ "scf_guess": "read" }));
        assert!(matches!(
            Orca::new(0, 1).apply_params(&params),
            Err(EngineError::BadKeyword { .. })
        ));
    }
}
