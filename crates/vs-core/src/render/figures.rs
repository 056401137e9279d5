//! Figure builders for each command.

use plotters::style::{Color, HSLColor, RGBColor, BLUE, RED};

use super::{Figure, Layer};
use crate::evaluate::{AggregateFit, BinomialFit, RankedFit};
use crate::timeline::TimeUnit;

/// Above this many markers the per-point vote labels are left off.
pub const MAX_ANNOTATED_MARKERS: usize = 40;

const CURVE_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Color for the `rank`-th of `total` curves (0-based), purple through
/// green to yellow.
pub fn rank_color(rank: usize, total: usize) -> RGBColor {
    let span = total.saturating_sub(1).max(1) as f64;
    let hue = 0.75 - 0.6 * (rank as f64 / span);
    let c = HSLColor(hue, 0.65, 0.45).to_backend_color();
    RGBColor(c.rgb.0, c.rgb.1, c.rgb.2)
}

fn unit_desc(unit: TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Days => "days since release",
        TimeUnit::Hours => "hours since release",
    }
}

/// Aggregate curve with one marker per observation.
pub fn aggregate_figure(
    fit: &AggregateFit,
    reference_date: &str,
    unit: TimeUnit,
    show_markers: bool,
) -> Figure {
    let rate = &fit.rate;
    let mut figure = Figure::new(
        "Aggregate voting activity: f(Δt) = λ·e^(−λ·Δt)",
        format!("Δt ({})", unit_desc(unit)),
        "Probability density f(Δt)",
    )
    .with_size(1000, 600)
    .layer(Layer::Line {
        points: fit.curve.points().collect(),
        color: CURVE_COLOR,
        label: Some(format!(
            "λ={:.4}  votes: {:.0}  {}: {:.0}",
            rate.rate, rate.total_votes, unit, rate.total_elapsed
        )),
    });

    if show_markers {
        let annotations = if fit.markers.len() <= MAX_ANNOTATED_MARKERS {
            fit.markers
                .iter()
                .map(|m| format!("{:.0} votes", m.votes))
                .collect()
        } else {
            Vec::new()
        };
        figure = figure.layer(Layer::Markers {
            points: fit.markers.iter().map(|m| (m.t, m.density)).collect(),
            color: RED,
            label: Some("observations".to_string()),
            annotations,
        });
    }

    figure
        .note_line(format!("Reference date: {}", reference_date))
        .note_line(format!("Observations: {}", rate.observations))
}

/// One curve per ranked record, in rank order.
pub fn ranked_figure(fit: &RankedFit, reference_date: &str, unit: TimeUnit) -> Figure {
    let total = fit.curves.len();
    let mut figure = Figure::new(
        format!("Top-{} by voting intensity (λ): f(t) = λ·e^(−λ·t)", total),
        format!("t ({})", unit_desc(unit)),
        "Probability density f(t)",
    );

    for (i, ranked) in fit.curves.iter().enumerate() {
        let color = rank_color(i, total);
        figure = figure.layer(Layer::Line {
            points: ranked.curve.points().collect(),
            color,
            label: Some(format!(
                "{}  λ={:.2} ({:.0} votes)",
                ranked.rate.release_date, ranked.rate.rate, ranked.rate.votes
            )),
        });
        if let Some(marker) = &ranked.marker {
            figure = figure.layer(Layer::Markers {
                points: vec![(marker.t, marker.density)],
                color,
                label: None,
                annotations: Vec::new(),
            });
        }
    }

    figure
        .note_line(format!("Reference date: {}", reference_date))
        .note_line(format!("Records shown: {}", total))
}

/// PMF bars over the ±3σ window.
pub fn binomial_figure(fit: &BinomialFit) -> Figure {
    Figure::new(
        format!(
            "Binomial distribution B(n={}, p={:.3})",
            fit.params.num_trials, fit.params.success_probability
        ),
        "k",
        "P(X=k)",
    )
    .with_size(1000, 600)
    .layer(Layer::Bars {
        bars: fit
            .table
            .iter()
            .map(|row| (row.k as f64, row.probability))
            .collect(),
        width: 0.8,
        color: BLUE,
        label: None,
    })
    .note_line(format!("E[X] = {:.2}", fit.expected_value))
    .note_line(format!("σ = {:.2}", fit.std_deviation))
    .note_line(format!("Window mass = {:.4}", fit.window_mass))
}
