//! Driver for the `tblite` semi-empirical tight-binding program.
//!
//! Each evaluation writes an XYZ file into a scratch directory, runs
//! `tblite run --grad --json`, and reads the energy and gradient back from
//! the JSON results file. Native units are Hartree and Bohr; results are
//! converted to eV and Å on the way out.

use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    process::Command,
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

use matter::Structure;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    BOHR_TO_ANGSTROM, CalcResult, Calculator, EngineError, HARTREE_TO_EV,
    probe_executable,
};

static RUN_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Gfn1,
    #[default]
    Gfn2,
    Ipea1,
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Gfn1 => write!(f, "gfn1"),
            Method::Gfn2 => write!(f, "gfn2"),
            Method::Ipea1 => write!(f, "ipea1"),
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gfn1" | "gfn1-xtb" => Ok(Method::Gfn1),
            "gfn2" | "gfn2-xtb" => Ok(Method::Gfn2),
            "ipea1" | "ipea1-xtb" => Ok(Method::Ipea1),
            _ => Err(format!("no such tight-binding method {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tblite {
    pub method: Method,
    pub charge: isize,
    pub multiplicity: usize,
    pub accuracy: Option<f64>,
    pub iterations: Option<usize>,
    /// the executable to run
    pub cmd: String,
    /// root for per-run scratch directories. `None` uses self-cleaning
    /// temporary directories
    pub scratch: Option<PathBuf>,
}

impl Tblite {
    pub fn new(method: Method, charge: isize, multiplicity: usize) -> Self {
        Self {
            method,
            charge,
            multiplicity,
            accuracy: None,
            iterations: None,
            cmd: "tblite".to_string(),
            scratch: None,
        }
    }

    /// apply a free-form keyword table on top of `self`; unknown keys are
    /// rejected on the engine side of the recipe contract
    pub fn apply_params(
        mut self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<Self, EngineError> {
        let bad = |k: &String| EngineError::BadKeywordValue {
            program: "tblite".to_string(),
            keyword: k.clone(),
        };
        for (k, v) in params {
            match k.as_str() {
                "accuracy" => {
                    self.accuracy = Some(v.as_f64().ok_or_else(|| bad(k))?);
                }
                "iterations" => {
                    self.iterations =
                        Some(v.as_u64().ok_or_else(|| bad(k))? as usize);
                }
                "cmd" => {
                    self.cmd =
                        v.as_str().ok_or_else(|| bad(k))?.to_string();
                }
                "scratch" => {
                    self.scratch =
                        Some(v.as_str().ok_or_else(|| bad(k))?.into());
                }
                _ => {
                    return Err(EngineError::BadKeyword {
                        program: "tblite".to_string(),
                        keyword: k.clone(),
                    });
                }
            }
        }
        Ok(self)
    }
}

/// plain XYZ rendering of the structure, Å
pub(crate) fn xyz_string(s: &Structure) -> String {
    use std::fmt::Write;
    let mut ret = format!("{}\n{}\n", s.len(), s.formula());
    for a in &s.atoms {
        writeln!(ret, "{} {:.12} {:.12} {:.12}", a.symbol(), a.x, a.y, a.z)
            .unwrap();
    }
    ret
}

/// the subset of the tblite results file the driver consumes
#[derive(Debug, Deserialize)]
struct Results {
    /// Hartree
    energy: f64,
    /// Hartree/Bohr, flattened
    #[serde(default)]
    gradient: Vec<f64>,
}

/// read energy (Hartree) and gradient (Hartree/Bohr) from a tblite JSON
/// results file
pub(crate) fn parse_results(
    path: &Path,
) -> Result<(f64, Vec<f64>), EngineError> {
    let display = path.display().to_string();
    let contents = fs::read_to_string(path)
        .map_err(|e| EngineError::ReadFileError(display.clone(), e.kind()))?;
    let res: Results = serde_json::from_str(&contents)
        .map_err(|_| EngineError::EnergyNotFound(display.clone()))?;
    if res.gradient.is_empty() {
        return Err(EngineError::GradientNotFound(display));
    }
    Ok((res.energy, res.gradient))
}

impl Calculator for Tblite {
    fn name(&self) -> &'static str {
        "tblite"
    }

    fn parameters(&self) -> Value {
        json!({
            "method": self.method,
            "charge": self.charge,
            "spin_multiplicity": self.multiplicity,
            "accuracy": self.accuracy,
            "iterations": self.iterations,
        })
    }

    fn check_available(&self) -> Result<(), EngineError> {
        probe_executable(
            "tblite",
            &self.cmd,
            "Try pip install tblite or conda install tblite.",
        )
    }

    fn compute(&self, structure: &Structure) -> Result<CalcResult, EngineError> {
        let start = Instant::now();
        let (dir, _cleanup) = scratch_dir("tblite", &self.scratch)?;
        let infile = dir.join("mol.xyz");
        fs::write(&infile, xyz_string(structure)).map_err(|e| {
            EngineError::WriteFileError(
                infile.display().to_string(),
                e.kind(),
            )
        })?;

        let mut cmd = Command::new(&self.cmd);
        cmd.current_dir(&dir)
            .arg("run")
            .args(["--method", &self.method.to_string()])
            .args(["--charge", &self.charge.to_string()])
            .args(["--spin", &(self.multiplicity - 1).to_string()])
            .args(["--grad", "--json", "results.json"]);
        if let Some(acc) = self.accuracy {
            cmd.args(["--acc", &acc.to_string()]);
        }
        if let Some(iter) = self.iterations {
            cmd.args(["--iterations", &iter.to_string()]);
        }
        cmd.arg("mol.xyz");
        log::debug!("running {cmd:?}");
        let output = cmd.output().map_err(|e| spawn_error("tblite", e))?;
        if !output.status.success() {
            return Err(EngineError::Failed {
                program: "tblite".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        let (energy, gradient) = parse_results(&dir.join("results.json"))?;
        Ok(CalcResult {
            energy: energy * HARTREE_TO_EV,
            forces: forces_from_gradient(&gradient),
            time: start.elapsed().as_secs_f64(),
            dir: Some(dir),
        })
    }
}

/// convert a flattened Hartree/Bohr gradient into eV/Å forces
pub(crate) fn forces_from_gradient(gradient: &[f64]) -> Vec<[f64; 3]> {
    gradient
        .chunks_exact(3)
        .map(|g| {
            [
                -g[0] * HARTREE_TO_EV / BOHR_TO_ANGSTROM,
                -g[1] * HARTREE_TO_EV / BOHR_TO_ANGSTROM,
                -g[2] * HARTREE_TO_EV / BOHR_TO_ANGSTROM,
            ]
        })
        .collect()
}

/// a per-run scratch directory: a self-cleaning tempdir by default, or a
/// persistent unique subdirectory of the configured root
pub(crate) fn scratch_dir(
    prefix: &str,
    root: &Option<PathBuf>,
) -> Result<(PathBuf, Option<tempfile::TempDir>), EngineError> {
    match root {
        Some(root) => {
            let dir = root.join(format!(
                "{prefix}.{}.{}",
                std::process::id(),
                RUN_ID.fetch_add(1, Ordering::Relaxed)
            ));
            fs::create_dir_all(&dir).map_err(|e| {
                EngineError::WriteFileError(
                    dir.display().to_string(),
                    e.kind(),
                )
            })?;
            Ok((dir, None))
        }
        None => {
            let tmp = tempfile::Builder::new()
                .prefix(prefix)
                .tempdir()
                .map_err(|e| {
                    EngineError::WriteFileError(
                        prefix.to_string(),
                        e.kind(),
                    )
                })?;
            Ok((tmp.path().to_path_buf(), Some(tmp)))
        }
    }
}

pub(crate) fn spawn_error(
    program: &str,
    e: std::io::Error,
) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::MissingExecutable {
            program: program.to_string(),
            hint: format!("no {program} executable on PATH"),
        }
    } else {
        EngineError::Failed {
            program: program.to_string(),
            stderr: e.to_string(),
        }
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
    fn xyz_rendering() {
        let got = xyz_string(&water());
        let want = "3
H2O
O 0.000000000000 0.000000000000 0.119700000000
H 0.000000000000 0.761600000000 -0.478600000000
H 0.000000000000 -0.761600000000 -0.478600000000
";
        assert_eq!(got, want);
    }

    #[test]
    fn parse_sample_results() {
        let (energy, gradient) =
            parse_results(Path::new("testfiles/results.json")).unwrap();
        assert_abs_diff_eq!(energy, -5.070544440612, epsilon = 1e-12);
        assert_eq!(gradient.len(), 9);
        assert_abs_diff_eq!(gradient[2], 8.158926e-3, epsilon = 1e-9);
    }

    #[test]
    fn gradient_to_forces() {
        let f = forces_from_gradient(&[1.0, 0.0, 0.0, 0.0, -1.0, 0.0]);
        assert_eq!(f.len(), 2);
        assert!(f[0][0] < 0.0);
        assert!(f[1][1] > 0.0);
        assert_abs_diff_eq!(
            f[0][0],
            -HARTREE_TO_EV / BOHR_TO_ANGSTROM,
            epsilon = 1e-12
        );
    }

    #[test]
    fn method_round_trips() {
        for m in [Method::Gfn1, Method::Gfn2, Method::Ipea1] {
            assert_eq!(m.to_string().parse::<Method>(), Ok(m));
        }
        assert_eq!("GFN2-xTB".parse::<Method>(), Ok(Method::Gfn2));
        assert!("pm6".parse::<Method>().is_err());
    }

    #[test]
    fn missing_executable() {
        let mut t = Tblite::new(Method::Gfn2, 0, 1);
        t.cmd = "definitely-not-a-tblite-install".to_string();
        assert!(matches!(
            t.check_available(),
            Err(EngineError::MissingExecutable { .. })
        ));
        assert!(matches!(
            t.compute(&water()),
            Err(EngineError::MissingExecutable { .. })
        ));
    }

    #[test]
    fn unknown_keyword_rejected() {
        let mut params = serde_json::Map::new();
        params.insert("guess".to_string(), json!("sad"));
        assert!(matches!(
            Tblite::new(Method::Gfn2, 0, 1).apply_params(&params),
            Err(EngineError::BadKeyword { .. })
        ));
    }
}
