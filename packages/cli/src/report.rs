//! Plain-text rendering of a dashboard.

use std::fmt;

use aprehensys_analytics_models::{Dashboard, LabelCount};

/// Formats a peso amount the way the dashboard cards do: `$ 1.234.567`,
/// rounded to whole pesos.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_cop(value: f64) -> String {
    let whole = value.max(0.0).round() as u64;
    let digits = whole.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("$ {grouped}")
}

fn write_histogram(f: &mut fmt::Formatter<'_>, title: &str, counts: &[LabelCount]) -> fmt::Result {
    writeln!(f, "\n{title}")?;
    let width = counts.iter().map(|c| c.label.chars().count()).max().unwrap_or(0);
    for c in counts {
        writeln!(f, "  {:<width$}  {}", c.label, c.count)?;
    }
    Ok(())
}

/// Text view of a [`Dashboard`]: stats, both histograms, and the map
/// markers.
pub struct DashboardReport<'a>(pub &'a Dashboard);

impl fmt::Display for DashboardReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dashboard = self.0;
        let selection = &dashboard.selection;

        writeln!(
            f,
            "Municipio: {}  Comuna: {}  Líder: {}",
            selection.municipality, selection.commune, selection.leader
        )?;

        if !dashboard.has_results {
            return writeln!(f, "\nNo hay resultados.");
        }

        let stats = &dashboard.stats;
        writeln!(f, "\nValor comercial total: {}", format_cop(stats.total_value))?;
        writeln!(f, "Aprehensiones:         {}", stats.count)?;
        writeln!(f, "Valor promedio:        {}", format_cop(stats.average_value))?;
        writeln!(f, "Clasificaciones:       {}", stats.distinct_classifications)?;

        write_histogram(f, "Por clasificación", &dashboard.by_classification)?;
        write_histogram(f, "Por origen", &dashboard.by_origin)?;

        let view = &dashboard.map_view;
        writeln!(
            f,
            "\nMapa ({}, zoom {} en {:.4}, {:.4})",
            if dashboard.map_aggregated {
                "por municipio"
            } else {
                "por aprehensión"
            },
            view.zoom,
            view.center.lat,
            view.center.lng
        )?;
        for point in &dashboard.map_points {
            writeln!(
                f,
                "  {} ({:.4}, {:.4})  {} x{}",
                point.label,
                point.lat,
                point.lng,
                format_cop(point.total_value),
                point.count
            )?;
        }

        Ok(())
    }
}

/// Renders `dashboard` as plain text.
#[must_use]
pub fn format_dashboard(dashboard: &Dashboard) -> String {
    DashboardReport(dashboard).to_string()
}

#[cfg(test)]
mod tests {
    use aprehensys_analytics_models::{FilterSelection, MapDefaults};
    use aprehensys_apprehension_models::Apprehension;
    use chrono::NaiveDate;

    use super::*;

    fn record(id: &str, classification: &str, value: f64) -> Apprehension {
        Apprehension {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            municipality: "CUCUTA".to_string(),
            commune: None,
            address: String::new(),
            classification: classification.to_string(),
            sector: String::new(),
            origin: "RETEN".to_string(),
            commercial_value: value,
            lat: 7.9,
            lng: -72.5,
            leader: "POLFA".to_string(),
        }
    }

    #[test]
    fn formats_pesos_with_dot_grouping() {
        assert_eq!(format_cop(0.0), "$ 0");
        assert_eq!(format_cop(999.4), "$ 999");
        assert_eq!(format_cop(1000.0), "$ 1.000");
        assert_eq!(format_cop(1_234_567.6), "$ 1.234.568");
    }

    #[test]
    fn renders_stats_and_histograms() {
        let records = vec![
            record("1", "TEXTILES", 100.0),
            record("2", "TEXTILES", 200.0),
            record("3", "LICORES", 300.0),
        ];
        let dashboard = aprehensys_analytics::build_dashboard(
            &records,
            &FilterSelection::default(),
            &MapDefaults::default(),
        );
        let text = format_dashboard(&dashboard);

        assert!(text.contains("Valor comercial total: $ 600"));
        assert!(text.contains("Valor promedio:        $ 200"));
        assert!(text.contains("TEXTILES  2"));
        assert!(text.contains("CUCUTA"));
        assert!(text.contains("por municipio"));
    }

    #[test]
    fn renders_no_results() {
        let dashboard = aprehensys_analytics::build_dashboard(
            &[],
            &FilterSelection::default(),
            &MapDefaults::default(),
        );
        assert!(format_dashboard(&dashboard).contains("No hay resultados."));
    }

    #[test]
    fn histogram_labels_are_padded_to_widest() {
        let records = vec![
            record("1", "TEXTILES", 100.0),
            record("2", "LICORES", 300.0),
        ];
        let dashboard = aprehensys_analytics::build_dashboard(
            &records,
            &FilterSelection::default(),
            &MapDefaults::default(),
        );
        let text = DashboardReport(&dashboard).to_string();

        assert!(text.contains("\nPor clasificación\n  TEXTILES  1\n  LICORES   1\n"));
        assert_eq!(text, format_dashboard(&dashboard));
    }

    #[test]
    fn empty_report_stops_after_selection() {
        let dashboard = aprehensys_analytics::build_dashboard(
            &[],
            &FilterSelection::default(),
            &MapDefaults::default(),
        );
        assert_eq!(
            format_dashboard(&dashboard),
            "Municipio: all  Comuna: all  Líder: all\n\nNo hay resultados.\n"
        );
    }
}
