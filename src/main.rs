use std::path::Path;

use arim_rust_utils_core::model::Grid;
use arim_rust_utils_core::plots::{plot_oxz, PlotOxzConfig, Scale};
use clap::Parser;
use ndarray::Array2;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base path for the saved figure; `_<scale>` is inserted before the extension
    #[arg(short, long)]
    output: String,

    /// Amplitude scale, "linear" or "db"
    #[arg(short, long, default_value = "linear")]
    scale: String,

    #[arg(short, long)]
    title: Option<String>,

    /// Lower color limit (requires --clim-max)
    #[arg(long)]
    clim_min: Option<f64>,

    /// Upper color limit (requires --clim-min)
    #[arg(long)]
    clim_max: Option<f64>,
}

fn main() {
    let args = Args::parse();
    let scale: Scale = args.scale.parse().unwrap();

    // Demo field: two interfering plane waves over a 10 x 15 mm slice.
    let grid = Grid::new(-5e-3, 5e-3, 0.0, 0.0, 0.0, 15e-3, 0.1e-3).unwrap();
    let wavenumber = 2.0 * std::f64::consts::PI / 10e-3;
    let xx = grid.xx();
    let zz = grid.zz();
    let field = Array2::from_shape_fn((grid.numx(), grid.numz()), |(i, k)| {
        (xx[[i, k]] * 2.0 * wavenumber).cos() * (zz[[i, k]] * wavenumber).sin() * zz[[i, k]].powi(2)
    });

    let mut config = PlotOxzConfig::new()
        .with_scale(scale)
        .with_savefig(Path::new(&args.output));
    if let Some(title) = &args.title {
        config = config.with_title(title);
    }
    if let (Some(min), Some(max)) = (args.clim_min, args.clim_max) {
        config = config.with_clim(min, max);
    }

    plot_oxz(&field, &grid, &config).unwrap();
    println!(
        "Rendered {} x {} field with scale {}",
        grid.numx(),
        grid.numz(),
        scale.as_str()
    );
}
