//! Dashboard pages and rendered page content.

use super::config::Layout;
use crate::error::{ForecastError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The analysis views selectable from the sidebar menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    TimeSeries,
    CctvAccidents,
    TrafficVolume,
    PublicTransit,
    Population,
    Parking,
}

impl Page {
    /// Menu order.
    pub const ALL: [Page; 7] = [
        Page::Home,
        Page::TimeSeries,
        Page::CctvAccidents,
        Page::TrafficVolume,
        Page::PublicTransit,
        Page::Population,
        Page::Parking,
    ];

    /// Sidebar entry, icon included.
    pub fn menu_label(&self) -> &'static str {
        match self {
            Page::Home => "🏠 Home",
            Page::TimeSeries => "📘 시계열 분석",
            Page::CctvAccidents => "📊 CCTV & 사고",
            Page::TrafficVolume => "🚗 교통량 vs 자동차",
            Page::PublicTransit => "🚌 대중교통 영향",
            Page::Population => "🏙 인구 기반 분석",
            Page::Parking => "🅿️ 주차면 분석",
        }
    }

    /// Page heading.
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "🚦 서울시 교통 데이터 분석 프로젝트",
            Page::TimeSeries => "📘 자동차 등록 대수 시계열 분석",
            Page::CctvAccidents => "📊 교통 관련 CCTV 갯수 / 설치된 CCTV 지역의 사고건수 분석",
            Page::TrafficVolume => "📈 자동차 등록과 교통량 관계 분석",
            Page::PublicTransit => "🚌 대중교통 이용 영향 분석",
            Page::Population => "🏙 인구 변화 기반 자동차 분석",
            Page::Parking => "🅿️ 자동차 수 vs 주차면 분석",
        }
    }

    /// One-line topic shown on the home overview.
    pub fn description(&self) -> &'static str {
        match self {
            Page::Home => "자동차 등록 · 교통량 · CCTV · 인구 · 대중교통 데이터를 활용한 종합 분석 대시보드",
            Page::TimeSeries => "자동차 등록 대수 변화 예측",
            Page::CctvAccidents => "안전 인프라와 사고 심각도",
            Page::TrafficVolume => "등록대수와 교통량 상관관계",
            Page::PublicTransit => "버스 이용과 승용차 변화",
            Page::Population => "자치구별 자동차 증감",
            Page::Parking => "자동차 수 vs 주차 인프라",
        }
    }

    /// URL-safe identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::TimeSeries => "time-series",
            Page::CctvAccidents => "cctv-accidents",
            Page::TrafficVolume => "traffic-volume",
            Page::PublicTransit => "public-transit",
            Page::Population => "population",
            Page::Parking => "parking",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.menu_label())
    }
}

impl FromStr for Page {
    type Err = ForecastError;

    /// Accepts a menu label or a slug.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Page::ALL
            .iter()
            .copied()
            .find(|page| page.menu_label() == s || page.slug() == s)
            .ok_or_else(|| ForecastError::UnknownPage(s.to_string()))
    }
}

/// One block of rendered page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    /// Short labelled text, e.g. a topic card.
    Card { heading: String, body: String },
    /// Labelled numbers shown side by side.
    Metrics { heading: String, values: Vec<(String, f64)> },
    /// Structured data for a chart or table.
    Data {
        heading: String,
        payload: serde_json::Value,
    },
    /// Preformatted text.
    Text { heading: String, body: String },
    /// Highlighted hint.
    Notice { body: String },
}

/// Presentation settings the front end applies to a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStyle {
    pub layout: Layout,
    /// Font family for Hangul chart labels.
    pub font_family: String,
    pub stylesheet: Option<PathBuf>,
}

/// Rendered content of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub caption: Option<String>,
    /// Filled in by the dashboard from its configuration.
    pub style: Option<PageStyle>,
    pub sections: Vec<Section>,
}

impl PageView {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            title: page.title().to_string(),
            caption: None,
            style: None,
            sections: Vec::new(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_style(mut self, style: PageStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_slugs_round_trip() {
        for page in Page::ALL {
            assert_eq!(page.menu_label().parse::<Page>().unwrap(), page);
            assert_eq!(page.slug().parse::<Page>().unwrap(), page);
        }
    }

    #[test]
    fn unknown_label_is_error() {
        assert_eq!(
            "📈 주가 분석".parse::<Page>(),
            Err(ForecastError::UnknownPage("📈 주가 분석".to_string()))
        );
    }

    #[test]
    fn menu_order_starts_at_home() {
        assert_eq!(Page::ALL[0], Page::Home);
        assert_eq!(Page::ALL[1], Page::TimeSeries);
        assert_eq!(Page::TimeSeries.to_string(), "📘 시계열 분석");
    }

    #[test]
    fn sections_serialize_with_kind_tag() {
        let section = Section::Notice {
            body: "hint".to_string(),
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["kind"], "notice");
        assert_eq!(json["body"], "hint");
    }
}
