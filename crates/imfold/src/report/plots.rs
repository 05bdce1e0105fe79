//! # SVG Plots
//!
//! Plots are rendered with the `plotters` SVG backend.

use crate::report::confusion::ConfusionMatrix;
use crate::training::history::TrainingHistory;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// File name of the training curves plot.
pub const TRAINING_CURVES_FILE_NAME: &str = "training_curves.svg";

/// File name of the confusion matrix plot.
pub const CONFUSION_MATRIX_FILE_NAME: &str = "confusion_matrix.svg";

const FONT: &str = "sans-serif";

// Matplotlib "Blues" end points.
const BLUES_LOW: (u8, u8, u8) = (247, 251, 255);
const BLUES_HIGH: (u8, u8, u8) = (8, 48, 107);

/// Linear blend between two colors, `t` in ``[0, 1]``.
fn interpolate_color(
    low: (u8, u8, u8),
    high: (u8, u8, u8),
    t: f64,
) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(low.0, high.0), mix(low.1, high.1), mix(low.2, high.2))
}

/// A padded y range over the finite values; ``0..1`` when there are none.
fn value_range<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}

struct Curve<'a> {
    label: &'static str,
    values: &'a [f64],
    color: RGBColor,
}

fn draw_curve_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    caption: &str,
    y_desc: &str,
    y_range: Range<f64>,
    curves: &[Curve<'_>],
) -> anyhow::Result<()> {
    let epochs = curves.iter().map(|c| c.values.len()).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, (FONT, 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..(epochs as i32 + 1), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc(y_desc)
        .x_labels(epochs.clamp(1, 20) + 1)
        .draw()?;

    for curve in curves {
        let color = curve.color;
        let points = curve
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as i32 + 1, v));

        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(curve.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Plot loss and accuracy curves to ``training_curves.svg`` under `dir`.
///
/// The left panel shows train/val loss, the right train/val accuracy;
/// non-finite values are skipped. Returns the written path.
pub fn plot_training_curves(
    history: &TrainingHistory,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let path = dir.join(TRAINING_CURVES_FILE_NAME);

    let train_losses = history.train_losses();
    let valid_losses = history.valid_losses();
    let train_accs = history.train_accuracies();
    let valid_accs = history.valid_accuracies();

    {
        let root = SVGBackend::new(&path, (1200, 500)).into_drawing_area();
        root.fill(&WHITE)?;
        let (left, right) = root.split_horizontally(600);

        draw_curve_panel(
            &left,
            "Training and Validation Losses",
            "Loss",
            value_range(train_losses.iter().chain(&valid_losses)),
            &[
                Curve {
                    label: "Train Loss",
                    values: &train_losses,
                    color: BLUE,
                },
                Curve {
                    label: "Val Loss",
                    values: &valid_losses,
                    color: RED,
                },
            ],
        )?;

        draw_curve_panel(
            &right,
            "Training and Validation Accuracies",
            "Accuracy (%)",
            0.0..100.0,
            &[
                Curve {
                    label: "Train Accuracy",
                    values: &train_accs,
                    color: BLUE,
                },
                Curve {
                    label: "Val Accuracy",
                    values: &valid_accs,
                    color: RED,
                },
            ],
        )?;

        root.present()?;
    }

    tracing::info!("Training curves saved to {}", path.display());
    Ok(path)
}

/// Plot an annotated blue-scale heatmap to ``confusion_matrix.svg`` under `dir`.
///
/// Columns are predicted classes, rows true classes. Returns the written path.
pub fn plot_confusion_matrix(
    cm: &ConfusionMatrix,
    classes: &[String],
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let path = dir.join(CONFUSION_MATRIX_FILE_NAME);

    let n = cm.num_classes() as i32;
    let name = |i: &i32| {
        usize::try_from(*i)
            .ok()
            .filter(|&i| i < cm.num_classes())
            .map(|i| classes.get(i).cloned().unwrap_or_else(|| i.to_string()))
            .unwrap_or_default()
    };

    let side = (cm.num_classes() as u32 * 80).max(320);
    let max_count = cm.max_count().max(1) as f64;

    {
        let root = SVGBackend::new(&path, (side + 220, side + 180)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Confusion Matrix", (FONT, 22))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(140)
            // Row 0 on top.
            .build_cartesian_2d(0i32..n.max(1), n.max(1)..0i32)?;

        let (width, height) = chart.plotting_area().dim_in_pixel();
        let cell_w = (width as i32) / n.max(1);
        let cell_h = (height as i32) / n.max(1);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(n as usize + 1)
            .y_labels(n as usize + 1)
            .x_label_offset(cell_w / 2)
            .y_label_offset(cell_h / 2)
            .x_label_formatter(&name)
            .y_label_formatter(&name)
            .x_desc("Predicted Label")
            .y_desc("True Label")
            .label_style((FONT, 14))
            .draw()?;

        let cells: Vec<(i32, i32, usize)> = cm
            .counts()
            .iter()
            .enumerate()
            .flat_map(|(t, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(p, &count)| (p as i32, t as i32, count))
            })
            .collect();

        chart.draw_series(cells.iter().map(|&(x, y, count)| {
            let color = interpolate_color(BLUES_LOW, BLUES_HIGH, count as f64 / max_count);
            Rectangle::new([(x, y), (x + 1, y + 1)], color.filled())
        }))?;

        chart.draw_series(cells.iter().map(|&(x, y, count)| {
            let color: &'static RGBColor = if count as f64 / max_count > 0.5 {
                &WHITE
            } else {
                &BLACK
            };
            let style = TextStyle::from((FONT, 16).into_font())
                .color(color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            EmptyElement::at((x, y)) + Text::new(count.to_string(), (cell_w / 2, cell_h / 2), style)
        }))?;

        root.present()?;
    }

    tracing::info!("Confusion matrix saved to {}", path.display());
    Ok(path)
}
