use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{anyhow, bail, ensure, Result};
use colorgrad::Gradient;
use image::RgbImage;
use ndarray::{Array2, ArrayBase, Data, Dimension};
use ndarray_stats::QuantileExt;
use plotters::prelude::*;

use crate::model::Grid;
use crate::signal;

static DEFAULT_SAVE_FORMAT: Mutex<Option<String>> = Mutex::new(None);

/// Change the process-wide image format used when a figure is saved to a path
/// without extension. Callers that must stay isolated from this global should
/// set `PlotOxzConfig::format` instead.
pub fn set_default_save_format(format: &str) {
    let mut guard = DEFAULT_SAVE_FORMAT.lock().unwrap();
    *guard = Some(format.trim_start_matches('.').to_string());
}

pub fn default_save_format() -> String {
    let guard = DEFAULT_SAVE_FORMAT.lock().unwrap();
    guard.clone().unwrap_or_else(|| "png".to_string())
}

/// Amplitude scaling applied before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    Linear,
    Db,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Db => "db",
        }
    }
}

impl FromStr for Scale {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "linear" => Ok(Scale::Linear),
            "db" => Ok(Scale::Db),
            other => Err(anyhow!(
                "unknown scale {:?}, expected \"linear\" or \"db\"",
                other
            )),
        }
    }
}

/// Options for one `plot_oxz` call.
///
/// `clim` bounds the color mapping, in dB when `scale` is `Scale::Db`. Without
/// it the mapping spans the data range. `format` overrides the process-wide
/// default save format for paths without extension.
pub struct PlotOxzConfig {
    pub title: Option<String>,
    pub scale: Scale,
    pub clim: Option<(f64, f64)>,
    pub savefig: bool,
    pub filename: Option<PathBuf>,
    pub format: Option<String>,
    pub figsize: (u32, u32),
}

impl Default for PlotOxzConfig {
    fn default() -> Self {
        PlotOxzConfig {
            title: None,
            scale: Scale::Linear,
            clim: None,
            savefig: false,
            filename: None,
            format: None,
            figsize: (800, 600),
        }
    }
}

impl PlotOxzConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_clim(mut self, min: f64, max: f64) -> Self {
        self.clim = Some((min, max));
        self
    }

    pub fn with_savefig(mut self, filename: &Path) -> Self {
        self.savefig = true;
        self.filename = Some(filename.to_path_buf());
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.trim_start_matches('.').to_string());
        self
    }
}

/// Rendered oxz figure: the scaled values actually displayed plus the raster.
pub struct OxzFigure {
    pub scaled: Array2<f64>,
    pub image: RgbImage,
    pub x_extent: (f64, f64),
    pub z_extent: (f64, f64),
}

impl OxzFigure {
    /// Write the raster to `path`; the format is inferred from its extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Render a scalar field sampled on the oxz plane of `grid`.
///
/// `data` is accepted flat (length `numx * numz`, points ordered x-major) or
/// already shaped `(numx, numz)`. With `Scale::Db` the displayed values are
/// `20 log10(|v| / max|v|)`, floored at `signal::DB_FLOOR`. When
/// `config.savefig` is set the figure is written to the configured filename
/// with `_<scale>` inserted before the extension.
pub fn plot_oxz<S, D>(
    data: &ArrayBase<S, D>,
    grid: &Grid,
    config: &PlotOxzConfig,
) -> Result<OxzFigure>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let save_target = if config.savefig {
        let filename = config
            .filename
            .as_ref()
            .ok_or_else(|| anyhow!("savefig requested but no filename given"))?;
        Some(derive_save_path(
            filename,
            config.scale,
            config.format.as_deref(),
        ))
    } else {
        None
    };

    let field = to_oxz_array(data, grid)?;
    let scaled = match config.scale {
        Scale::Linear => field,
        Scale::Db => signal::decibel(&field),
    };
    let image = render(&scaled, grid, config)?;
    let figure = OxzFigure {
        scaled,
        image,
        x_extent: (grid.xmin, grid.xmax),
        z_extent: (grid.zmin, grid.zmax),
    };

    if let Some(path) = save_target {
        figure.save(&path)?;
    }
    Ok(figure)
}

/// Normalize caller data to `(numx, numz)`, reshaping flat input.
fn to_oxz_array<S, D>(data: &ArrayBase<S, D>, grid: &Grid) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let numx = grid.numx();
    let numz = grid.numz();
    match data.ndim() {
        1 => {
            ensure!(
                data.len() == numx * numz,
                "data has {} points, grid expects {} ({} x {})",
                data.len(),
                numx * numz,
                numx,
                numz
            );
            Ok(Array2::from_shape_vec(
                (numx, numz),
                data.iter().cloned().collect(),
            )?)
        }
        2 => {
            ensure!(
                data.shape() == [numx, numz],
                "data has shape {:?}, grid expects ({}, {})",
                data.shape(),
                numx,
                numz
            );
            Ok(Array2::from_shape_vec(
                (numx, numz),
                data.iter().cloned().collect(),
            )?)
        }
        n => bail!("expected 1-d or 2-d data, got {} dimensions", n),
    }
}

/// Insert `_<scale>` before the extension; extensionless paths get the per-call
/// format override or the process-wide default.
fn derive_save_path(filename: &Path, scale: Scale, format: Option<&str>) -> PathBuf {
    let extension = filename
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .or_else(|| format.map(|f| f.to_string()))
        .unwrap_or_else(default_save_format);
    let stem = filename
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    filename.with_file_name(format!("{}_{}.{}", stem, scale.as_str(), extension))
}

fn color_limits(scaled: &Array2<f64>, clim: Option<(f64, f64)>) -> (f64, f64) {
    match clim {
        Some(limits) => limits,
        None => (*scaled.min_skipnan(), *scaled.max_skipnan()),
    }
}

fn value_to_color<G: Gradient>(value: f64, cmin: f64, cmax: f64, gradient: &G) -> RGBColor {
    let normalized = if cmax > cmin {
        ((value - cmin) / (cmax - cmin)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let rgba = gradient.at(normalized as f32).to_rgba8();
    RGBColor(rgba[0], rgba[1], rgba[2])
}

fn render(scaled: &Array2<f64>, grid: &Grid, config: &PlotOxzConfig) -> Result<RgbImage> {
    let (width, height) = config.figsize;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (cmin, cmax) = color_limits(scaled, config.clim);
        let half = grid.pixel_size / 2.0;
        let x_range = (grid.xmin - half)..(grid.xmax + half);
        let z_range = (grid.zmin - half)..(grid.zmax + half);

        let mut builder = ChartBuilder::on(&root);
        builder.margin(10).x_label_area_size(40).y_label_area_size(40);
        if let Some(title) = &config.title {
            builder.caption(title, ("sans-serif", 30));
        }
        let mut chart = builder.build_cartesian_2d(x_range, z_range)?;
        chart
            .configure_mesh()
            .x_desc("x (m)")
            .y_desc("z (m)")
            .draw()?;

        let gradient = colorgrad::preset::rd_yl_bu();
        let field = scaled;
        chart.draw_series((0..grid.numx()).flat_map(|i| {
            let gradient = &gradient;
            let x = grid.x[i];
            (0..grid.numz()).map(move |k| {
                let z = grid.z[k];
                let color = value_to_color(field[[i, k]], cmin, cmax, gradient);
                Rectangle::new([(x - half, z - half), (x + half, z + half)], color.filled())
            })
        }))?;

        root.present()?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| anyhow!("rendered buffer does not match the figure size"))
}
