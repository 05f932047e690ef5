//! Dashboard hosting layer around the forecasting pipeline.
//!
//! A [`Dashboard`] is built once per process from an explicit [`DashboardConfig`] and a
//! [`DataSource`]. Pages are rendered through the static [`PAGE_HANDLERS`] table; series
//! lookups go through a [`QueryCache`] owned by the dashboard.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use traffic_forecast::core::TimeSeries;
//! use traffic_forecast::dashboard::{Dashboard, DashboardConfig, InMemorySource, Page, SeriesQuery};
//!
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let values: Vec<f64> = (0..36).map(|i| 3_100_000.0 + 1_200.0 * i as f64).collect();
//! let source = InMemorySource::new()
//!     .with_series(SeriesQuery::registrations(), TimeSeries::from_start(start, values).unwrap());
//!
//! let mut dashboard = Dashboard::init(DashboardConfig::default(), source).unwrap();
//! let view = dashboard.render(Page::TimeSeries).unwrap();
//! assert_eq!(view.page, Page::TimeSeries);
//! ```

mod cache;
mod config;
mod page;
mod source;

pub use cache::{CacheStats, QueryCache};
pub use self::config::{CacheConfig, DashboardConfig, Layout, ENV_PREFIX};
pub use page::{Page, PageStyle, PageView, Section};
pub use source::{DataSource, InMemorySource, SeriesQuery, REGISTRATION_TABLE};

use crate::error::{ForecastError, Result};
use crate::pipeline::ForecastPipeline;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Renders one page.
pub type PageHandler = fn(&mut Dashboard, Page) -> Result<PageView>;

/// Render handler for every page, in menu order.
pub static PAGE_HANDLERS: [(Page, PageHandler); 7] = [
    (Page::Home, render_home),
    (Page::TimeSeries, render_time_series),
    (Page::CctvAccidents, render_static),
    (Page::TrafficVolume, render_static),
    (Page::PublicTransit, render_static),
    (Page::Population, render_static),
    (Page::Parking, render_static),
];

/// Application state: configuration, data source, and query cache.
pub struct Dashboard {
    config: DashboardConfig,
    source: Box<dyn DataSource>,
    cache: QueryCache,
    pipeline: ForecastPipeline,
    query: SeriesQuery,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Build the dashboard and install the log subscriber.
    ///
    /// A subscriber installed earlier in the process is left in place.
    pub fn init(config: DashboardConfig, source: impl DataSource + 'static) -> Result<Self> {
        config.validate()?;

        let filter = EnvFilter::try_new(&config.log_filter)
            .map_err(|e| ForecastError::Config(format!("invalid log filter: {e}")))?;
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

        info!(title = %config.title, layout = ?config.layout, "dashboard initialised");
        Ok(Self {
            cache: QueryCache::from_config(&config.cache),
            config,
            source: Box::new(source),
            pipeline: ForecastPipeline::new(),
            query: SeriesQuery::registrations(),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Series shown on the time-series page.
    pub fn query(&self) -> &SeriesQuery {
        &self.query
    }

    pub fn set_query(&mut self, query: SeriesQuery) {
        self.query = query;
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Start a new viewing session; cached series are fetched again.
    pub fn new_session(&mut self) {
        debug!(entries = self.cache.len(), "clearing query cache for new session");
        self.cache.clear();
    }

    pub fn render(&mut self, page: Page) -> Result<PageView> {
        let handler = PAGE_HANDLERS
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, handler)| *handler)
            .ok_or_else(|| ForecastError::UnknownPage(page.slug().to_string()))?;
        debug!(page = page.slug(), "rendering page");
        let view = handler(self, page)?;
        Ok(view.with_style(self.config.page_style()))
    }

    /// Render the page selected by a menu label or slug.
    pub fn render_menu(&mut self, selection: &str) -> Result<PageView> {
        let page: Page = selection.parse()?;
        self.render(page)
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ForecastError::ComputationError(e.to_string()))
}

fn render_home(_dashboard: &mut Dashboard, page: Page) -> Result<PageView> {
    let mut view = PageView::new(page).with_caption(page.description());
    for topic in Page::ALL.iter().filter(|p| **p != Page::Home) {
        view.push(Section::Card {
            heading: topic.menu_label().to_string(),
            body: topic.description().to_string(),
        });
    }
    view.push(Section::Notice {
        body: "⬅ 좌측 메뉴에서 분석을 선택하세요.".to_string(),
    });
    Ok(view)
}

fn render_time_series(dashboard: &mut Dashboard, page: Page) -> Result<PageView> {
    let series = dashboard
        .cache
        .get_or_fetch(&dashboard.query, |q| dashboard.source.monthly_registrations(q))?;
    let report = dashboard.pipeline.run(&series)?;

    let mut view = PageView::new(page).with_caption(page.description());
    view.push(Section::Data {
        heading: "📈 월별 자동차 등록 추세".to_string(),
        payload: to_payload(&report.original)?,
    });
    view.push(Section::Data {
        heading: "📉 1차 차분".to_string(),
        payload: to_payload(&report.differenced)?,
    });
    view.push(Section::Data {
        heading: "🧪 정상성 검정".to_string(),
        payload: to_payload(&report.stationarity)?,
    });
    view.push(Section::Metrics {
        heading: "📊 ARIMA(1,1,1) 모델 요약".to_string(),
        values: vec![
            ("AIC".to_string(), report.diagnostics.aic),
            ("BIC".to_string(), report.diagnostics.bic),
            ("관측치 수".to_string(), report.diagnostics.nobs as f64),
        ],
    });
    view.push(Section::Text {
        heading: "📄 ARIMA 상세 결과".to_string(),
        body: report.diagnostics.summary.clone(),
    });
    view.push(Section::Data {
        heading: "🔮 미래 12개월 자동차 등록 대수 예측".to_string(),
        payload: to_payload(&report.forecast)?,
    });
    Ok(view)
}

/// Pages whose analyses are produced outside this crate: metadata only.
fn render_static(_dashboard: &mut Dashboard, page: Page) -> Result<PageView> {
    Ok(PageView::new(page).with_caption(page.description()))
}
