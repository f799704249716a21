mod oxz;

pub use oxz::{
    default_save_format, plot_oxz, set_default_save_format, OxzFigure, PlotOxzConfig, Scale,
};
