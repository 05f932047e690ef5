//! Forecast Seoul vehicle registrations from monthly loader rows.
//!
//! Run with: cargo run --example registrations [dashboard.toml]

use traffic_forecast::core::MonthlyRecord;
use traffic_forecast::dashboard::{
    Dashboard, DashboardConfig, DataSource, InMemorySource, Page, Section, SeriesQuery,
};
use traffic_forecast::pipeline::ForecastPipeline;

fn sample_records() -> Vec<MonthlyRecord> {
    let mut value = 3_118_000.0;
    (0..48)
        .map(|i| {
            // Irregular monthly growth with a seasonal dip in winter.
            let month = i % 12 + 1;
            let seasonal = if month == 1 || month == 2 { -900.0 } else { 300.0 };
            value += 1_100.0 + seasonal + 250.0 * (i as f64 * 1.7).sin();
            MonthlyRecord {
                year: 2020 + (i / 12) as i32,
                month: month as u32,
                value,
            }
        })
        .collect()
}

fn main() {
    println!("=== Seoul vehicle registrations ===\n");

    // 1. Load configuration (file is optional)
    let config = match std::env::args().nth(1) {
        Some(path) => DashboardConfig::load(&path).unwrap(),
        None => DashboardConfig::default(),
    };
    println!("Dashboard: {} {}", config.icon, config.title);

    // 2. Register the series with the data source
    let mut source = InMemorySource::new();
    source
        .insert_records(SeriesQuery::registrations(), &sample_records())
        .unwrap();
    let series = source
        .monthly_registrations(&SeriesQuery::registrations())
        .unwrap();
    println!("Loaded {} monthly observations", series.len());

    // 3. Run the pipeline directly
    let report = ForecastPipeline::new().run(&series).unwrap();

    println!("\n--- Stationarity of first differences ---");
    for result in [&report.stationarity.adf, &report.stationarity.kpss] {
        println!(
            "{:<5} statistic {:>9.4}  p-value {:.4}  lags {}",
            result.test.name(),
            result.statistic,
            result.p_value,
            result.lags
        );
        for (label, cv) in result.critical_values.iter() {
            println!("        {:>5}: {:>8.4}", label, cv);
        }
    }

    println!("\n--- Model ---");
    println!("AIC: {:.2}", report.diagnostics.aic);
    println!("BIC: {:.2}", report.diagnostics.bic);
    println!("{}", report.diagnostics.summary);

    println!("\n--- 12-month forecast (95%) ---");
    println!("{:>8} {:>14} {:>14} {:>14}", "Month", "Lower", "Forecast", "Upper");
    println!("{:-<53}", "");
    for point in report.forecast.points() {
        println!(
            "{:>8} {:>14.0} {:>14.0} {:>14.0}",
            point.timestamp.format("%Y-%m"),
            point.lower,
            point.point,
            point.upper
        );
    }

    // 4. Render the same page through the dashboard
    let mut dashboard = Dashboard::init(config, source).unwrap();
    for page in Page::ALL {
        let view = dashboard.render(page).unwrap();
        let metrics = view
            .sections
            .iter()
            .filter(|s| matches!(s, Section::Metrics { .. }))
            .count();
        println!(
            "\n[{}] {} ({} sections, {} metric blocks)",
            page.slug(),
            view.title,
            view.sections.len(),
            metrics
        );
    }
    println!("\nCache: {:?}", dashboard.cache_stats());
}
