//! Calibration fitting from known-mass readings.
//!
//! Expected CSV headers:
//! raw,grams
//!
//! Example:
//! raw,grams
//! 842913,0.0
//! 1024913,100.0
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub raw: i64,
    pub grams: f32,
}

/// Device-form calibration: `grams = slope * (raw - tare)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedCalibration {
    pub slope: f32,
    pub tare: i32,
}

/// Least-squares line `grams = a * raw + b`.
#[derive(Debug, Clone, Copy)]
struct Line {
    a: f64,
    b: f64,
}

impl Line {
    fn fit(pts: &[(f64, f64)]) -> eyre::Result<Self> {
        let n = pts.len() as f64;
        let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
        let (sxx, sxy) = pts.iter().fold((0.0f64, 0.0f64), |(sxx, sxy), (x, y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });
        if !sxx.is_finite() || sxx == 0.0 {
            eyre::bail!("calibration cannot determine slope (degenerate raw spread)");
        }
        let a = sxy / sxx;
        if !a.is_finite() || a == 0.0 {
            eyre::bail!("calibration produced zero or non-finite slope");
        }
        Ok(Self {
            a,
            b: mean_y - a * mean_x,
        })
    }

    fn residual(&self, (x, y): (f64, f64)) -> f64 {
        y - (self.a * x + self.b)
    }
}

impl FittedCalibration {
    /// Fit from at least two rows with strictly monotonic raw values.
    ///
    /// Points whose residual exceeds twice the RMS residual of the first fit
    /// are dropped and the line refit, as long as two points remain.
    pub fn from_rows(rows: &[CalibrationRow]) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }
        check_monotonic(rows)?;

        let pts: Vec<(f64, f64)> = rows
            .iter()
            .map(|r| (r.raw as f64, f64::from(r.grams)))
            .collect();
        let first = Line::fit(&pts)?;

        let rms = (pts.iter().map(|p| first.residual(*p).powi(2)).sum::<f64>()
            / pts.len() as f64)
            .sqrt();
        let line = if rms.is_finite() && rms > 0.0 {
            let inliers: Vec<(f64, f64)> = pts
                .iter()
                .copied()
                .filter(|p| first.residual(*p).abs() <= 2.0 * rms)
                .collect();
            if inliers.len() >= 2 && inliers.len() < pts.len() {
                Line::fit(&inliers).unwrap_or(first)
            } else {
                first
            }
        } else {
            first
        };

        // grams == 0 at raw == -b/a
        let tare = (-line.b / line.a).round();
        if !tare.is_finite() || tare < f64::from(i32::MIN) || tare > f64::from(i32::MAX) {
            eyre::bail!("calibration produced a tare outside the raw-count range");
        }
        Ok(Self {
            slope: line.a as f32,
            tare: tare as i32,
        })
    }

    /// The protocol line that installs this calibration on a device.
    pub fn setcal_line(&self) -> String {
        format!("SETCAL {} {}", self.slope, self.tare)
    }
}

fn check_monotonic(rows: &[CalibrationRow]) -> eyre::Result<()> {
    let mut dir = 0i8;
    for (i, w) in rows.windows(2).enumerate() {
        let step = match w[1].raw.cmp(&w[0].raw) {
            std::cmp::Ordering::Equal => eyre::bail!(
                "calibration rows have duplicate raw values at index {} and {}",
                i,
                i + 1
            ),
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
        };
        if dir != 0 && dir != step {
            eyre::bail!(
                "calibration raw values must be monotonic (strictly increasing or strictly decreasing)"
            );
        }
        dir = step;
    }
    Ok(())
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<FittedCalibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    if headers.iter().ne(["raw", "grams"]) {
        eyre::bail!(
            "calibration CSV must have headers 'raw,grams', got: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        );
    }

    let rows = rdr
        .deserialize::<CalibrationRow>()
        .enumerate()
        .map(|(idx, rec)| rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e)))
        .collect::<eyre::Result<Vec<_>>>()?;

    FittedCalibration::from_rows(&rows)
}
