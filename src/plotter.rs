use std::path::Path;

use anyhow::{bail, Result};
use plotters::prelude::*;

use crate::catalog::Video;

const SHOW_RUNNING_MEAN: bool = true;
const SHOW_AVERAGE: bool = true;

/// Draws one point per comment (x = position in the video's comment list, y = sentiment),
/// plus the running mean and the overall average.
///
/// `scores` is what `QualityAnalyzer::score_comments` returns for `video.comments`.
pub fn plot_sentiment(video: &Video, scores: &[(&str, f64)], output_file: &Path) -> Result<()> {
    if scores.is_empty() {
        bail!("video {} has no comments to plot", video.id);
    }
    let n = scores.len();

    let root = BitMapBackend::new(output_file, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.margin(10, 10, 10, 10);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Comment Sentiment ({})", video.title),
            ("sans-serif", 30).into_font(),
        )
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0..n, -1.0..1.0)?;

    chart
        .configure_mesh()
        .x_desc("Comment")
        // label ticks with the comment id rather than its index
        .x_label_formatter(&|i: &usize| {
            scores
                .get(*i)
                .map(|(id, _)| (*id).to_string())
                .unwrap_or_default()
        })
        .y_desc("Sentiment")
        .y_label_formatter(&|s: &f64| format!("{s:.1}"))
        .draw()?;

    let color = Palette99::pick(0).to_rgba();
    chart
        .draw_series(PointSeries::of_element(
            scores.iter().enumerate().map(|(i, (_, s))| (i, *s)),
            4,
            color.filled(),
            &|c, s, st| EmptyElement::at(c) + Circle::new((0, 0), s, st.filled()),
        ))?
        .label("comment")
        .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));

    if SHOW_RUNNING_MEAN {
        let color = Palette99::pick(1).to_rgba();
        chart
            .draw_series(DashedLineSeries::new(
                running_mean(scores).into_iter().enumerate(),
                6,
                2,
                color.stroke_width(2),
            ))?
            .label("running mean")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if SHOW_AVERAGE {
        let color = Palette99::pick(2).to_rgba();
        let average = scores.iter().map(|(_, s)| s).sum::<f64>() / n as f64;
        chart
            .draw_series(LineSeries::new(
                [(0, average), (n, average)],
                color.stroke_width(2),
            ))?
            .label("average")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!(video = %video.id, path = %output_file.display(), "sentiment plot written");

    Ok(())
}

/// Mean of the first `i + 1` scores, for every `i`.
fn running_mean(scores: &[(&str, f64)]) -> Vec<f64> {
    scores
        .iter()
        .scan(0.0, |sum, (_, s)| {
            *sum += s;
            Some(*sum)
        })
        .enumerate()
        .map(|(i, sum)| sum / (i + 1) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_tracks_prefix_average() {
        let means = running_mean(&[("a", 1.0), ("b", -1.0), ("c", -1.0), ("d", 1.0)]);
        assert_eq!(means, vec![1.0, 0.0, -1.0 / 3.0, 0.0]);
    }

    #[test]
    fn nothing_to_plot_is_an_error() {
        let mut catalog = crate::catalog::Catalog::new();
        catalog
            .create_user("u1", "alice", "", crate::catalog::UserKind::Creator)
            .unwrap();
        let video = catalog
            .create_video("u1", "v1", "Quiet", "", 0, "")
            .unwrap()
            .clone();

        let dir = tempfile::tempdir().unwrap();
        let err = plot_sentiment(&video, &[], &dir.path().join("plot.png")).unwrap_err();
        assert!(err.to_string().contains("no comments"));
    }
}
