//! Results output: the `x,H` head file and the console report.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::solver::GatheredHead;
use crate::utils::convergence::SolveStats;

/// Write every gathered row as `x,H`, one per line, no header.
///
/// Values use `{:?}` so integral values keep their `.0`:
/// ```text
/// 0.0,1.0
/// 0.09900990099009901,0.9807...
/// ```
pub fn write_head_csv<W: Write>(head: &GatheredHead, writer: &mut W) -> Result<()> {
    for (x, h) in head.rows() {
        writeln!(writer, "{:?},{:?}", x, h)?;
    }
    Ok(())
}

pub fn write_head_file(head: &GatheredHead, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_head_csv(head, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Console summary printed by rank 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub elapsed: Duration,
    pub mflops: f64,
    pub rms_error: f64,
    /// Adjusted global interior point count
    pub n_global: usize,
}

impl Report {
    pub fn new(stats: &SolveStats, n_global: usize) -> Self {
        Self {
            elapsed: stats.elapsed,
            mflops: stats.mflops(n_global),
            rms_error: stats.rms_error.unwrap_or(f64::NAN),
            n_global,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total time        = {:.8}", self.elapsed.as_secs_f64())?;
        writeln!(f, "Mflops            = {:.1}", self.mflops)?;
        writeln!(f, "Error             = {:.16}", self.rms_error)?;
        write!(f, "N                 = {}", self.n_global)
    }
}
