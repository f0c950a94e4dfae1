//! Human-readable rendering helpers.

use wt_core::PacePositions;

/// Short weekday names, Sunday first to match the target schedule.
pub const WEEKDAY_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// `5h20m`-style signed duration.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "rounded absolute seconds fit i64 for any realistic duration"
)]
pub fn format_duration(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total = seconds.abs().round() as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    format!("{sign}{hours}h{minutes:02}m")
}

/// Truncating percentage, matching how summaries have always displayed it.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "ratio percentages are small by construction"
)]
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", (ratio * 100.0) as i64)
}

/// Race-style track with `[You]` and `[Ghost]` markers.
#[must_use]
pub fn render_ghost_plot(positions: PacePositions, length: usize) -> String {
    let mut track = vec!['-'; length];
    place_marker(&mut track, "[Ghost]", positions.ghost);
    place_marker(&mut track, "[You]", positions.you);
    format!("[{}]", track.into_iter().collect::<String>())
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "positions are clamped to [0, 1] and tracks are short"
)]
fn place_marker(track: &mut [char], marker: &str, position: f64) {
    if track.is_empty() {
        return;
    }
    let start = ((position.clamp(0.0, 1.0) * track.len() as f64) as usize).min(track.len() - 1);
    for (offset, ch) in marker.chars().enumerate() {
        let Some(slot) = track.get_mut(start + offset) else {
            break;
        };
        *slot = ch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn durations_render_with_sign_and_padding() {
        assert_eq!(format_duration(0.0), "0h00m");
        assert_eq!(format_duration(5.0 * 3600.0 + 20.0 * 60.0), "5h20m");
        assert_eq!(format_duration(-90.0 * 60.0), "-1h30m");
        assert_eq!(format_duration(26.0 * 3600.0), "26h00m");
    }

    #[test]
    fn percent_truncates_like_the_original_display() {
        assert_eq!(format_percent(0.856), "85%");
        assert_eq!(format_percent(0.0), "0%");
        assert_eq!(format_percent(1.0), "100%");
    }

    #[test]
    fn ghost_plot_places_both_markers() {
        let plot = render_ghost_plot(
            PacePositions {
                you: 0.2,
                ghost: 0.7,
            },
            40,
        );
        assert_snapshot!(plot, @"[--------[You]---------------[Ghost]-----]");
    }

    #[test]
    fn finished_race_keeps_markers_on_the_track() {
        let plot = render_ghost_plot(
            PacePositions {
                you: 1.0,
                ghost: 0.0,
            },
            20,
        );
        assert!(plot.contains('['));
        assert!(plot.ends_with(']'));
        assert_eq!(plot.chars().count(), 22);
    }
}
