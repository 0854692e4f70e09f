//! Vertical split of the chart canvas into a price pane and up to two
//! indicator panes stacked below it.

use serde::Serialize;
use shared_utils::config::LayoutConfig;
use thiserror::Error;

use crate::models::{method::fields, record::RecordSeries};

pub const MAX_INDICATOR_PANES: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{requested} indicator panes requested, at most {max} fit under the price pane")]
    TooManyPanes { requested: usize, max: usize },
}

/// A requested indicator pane of fixed height, drawing one or more fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndicatorPane {
    pub name: String,
    pub fields: Vec<String>,
    pub height: u32,
}

impl IndicatorPane {
    pub fn new(name: impl Into<String>, fields: &[&str], height: u32) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            height,
        }
    }

    pub fn atr(height: u32) -> Self {
        Self::new("atr", &[fields::ATR], height)
    }

    /// Up/down trend bars share one pane.
    pub fn trend(height: u32) -> Self {
        Self::new("trend", &[fields::TREND_UP, fields::TREND_DOWN], height)
    }

    /// The ATR and trend panes at the heights of the `[chart]` table.
    pub fn configured(config: &LayoutConfig) -> Vec<IndicatorPane> {
        vec![
            Self::atr(config.atr_pane_height),
            Self::trend(config.trend_pane_height),
        ]
    }

    /// Keep only the candidates whose fields actually carry data in `series`.
    pub fn for_records(series: &RecordSeries, candidates: Vec<IndicatorPane>) -> Vec<IndicatorPane> {
        candidates
            .into_iter()
            .filter(|pane| pane.fields.iter().any(|f| series.has_field(f)))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PaneKind {
    Price,
    Indicator(String),
}

/// A horizontal band of the canvas, in pixels from the top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Band {
    pub kind: PaneKind,
    pub top: u32,
    pub height: u32,
}

impl Band {
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaneLayout {
    pub total_height: u32,
    /// Price band first, then indicator bands top to bottom.
    pub bands: Vec<Band>,
}

impl PaneLayout {
    /// `None` only for a hand-built layout without bands.
    pub fn price(&self) -> Option<&Band> {
        self.bands.first()
    }

    pub fn indicators(&self) -> &[Band] {
        self.bands.get(1..).unwrap_or_default()
    }

    pub fn used_height(&self) -> u32 {
        self.bands.iter().map(|b| b.height).sum()
    }
}

/// Split `total_height` between the price pane and `panes`.
///
/// Indicator panes keep their requested height while it fits; once the
/// canvas is exhausted later panes are clamped (down to zero). The price pane
/// gets whatever the indicator panes leave.
pub fn plan_panes(total_height: u32, panes: &[IndicatorPane]) -> Result<PaneLayout, LayoutError> {
    if panes.len() > MAX_INDICATOR_PANES {
        return Err(LayoutError::TooManyPanes {
            requested: panes.len(),
            max: MAX_INDICATOR_PANES,
        });
    }

    let mut remaining = total_height;
    let heights: Vec<u32> = panes
        .iter()
        .map(|pane| {
            let h = pane.height.min(remaining);
            remaining -= h;
            h
        })
        .collect();
    let price_height = remaining;

    let mut bands = Vec::with_capacity(panes.len() + 1);
    bands.push(Band {
        kind: PaneKind::Price,
        top: 0,
        height: price_height,
    });
    let mut top = price_height;
    for (pane, height) in panes.iter().zip(heights) {
        bands.push(Band {
            kind: PaneKind::Indicator(pane.name.clone()),
            top,
            height,
        });
        top += height;
    }

    Ok(PaneLayout {
        total_height,
        bands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn price_only_takes_everything() {
        let layout = plan_panes(600, &[]).unwrap();
        assert_eq!(layout.bands.len(), 1);
        assert_eq!(layout.price().unwrap().height, 600);
        assert!(layout.indicators().is_empty());
    }

    #[test]
    fn indicators_stack_under_price() {
        let layout = plan_panes(600, &[IndicatorPane::atr(100), IndicatorPane::trend(120)]).unwrap();
        assert_eq!(layout.price().unwrap().height, 380);
        let [atr, trend] = layout.indicators() else {
            panic!("expected two indicator bands");
        };
        assert_eq!((atr.top, atr.height), (380, 100));
        assert_eq!((trend.top, trend.height), (480, 120));
        assert_eq!(trend.bottom(), 600);
        assert_eq!(atr.kind, PaneKind::Indicator("atr".into()));
    }

    #[test]
    fn oversized_indicators_are_clamped() {
        let layout = plan_panes(150, &[IndicatorPane::atr(100), IndicatorPane::trend(100)]).unwrap();
        assert_eq!(layout.price().unwrap().height, 0);
        assert_eq!(layout.indicators()[0].height, 100);
        assert_eq!(layout.indicators()[1].height, 50);
        assert_eq!(layout.used_height(), 150);
    }

    #[test]
    fn configured_panes_use_chart_table_heights() {
        let config = LayoutConfig {
            atr_pane_height: 90,
            trend_pane_height: 70,
            ..LayoutConfig::default()
        };
        let panes = IndicatorPane::configured(&config);
        assert_eq!(panes, vec![IndicatorPane::atr(90), IndicatorPane::trend(70)]);

        let layout = plan_panes(500, &panes).unwrap();
        assert_eq!(layout.price().unwrap().height, 340);
        assert_eq!(layout.indicators()[1].top, 430);
    }

    #[test]
    fn layout_without_bands_has_no_price_pane() {
        let layout = PaneLayout {
            total_height: 100,
            bands: Vec::new(),
        };
        assert_eq!(layout.price(), None);
        assert!(layout.indicators().is_empty());
        assert_eq!(layout.used_height(), 0);
    }

    #[test]
    fn three_panes_are_rejected() {
        let panes = vec![IndicatorPane::atr(10); 3];
        assert_eq!(
            plan_panes(600, &panes),
            Err(LayoutError::TooManyPanes { requested: 3, max: 2 })
        );
    }

    proptest! {
        #[test]
        fn bands_fit_and_do_not_overlap(
            total in 0u32..5000,
            heights in proptest::collection::vec(0u32..3000, 0..=2),
        ) {
            let panes: Vec<IndicatorPane> = heights
                .iter()
                .map(|h| IndicatorPane::new("x", &["x"], *h))
                .collect();
            let layout = plan_panes(total, &panes).unwrap();

            prop_assert!(layout.used_height() <= total);
            let indicator_sum: u32 = layout.indicators().iter().map(|b| b.height).sum();
            prop_assert_eq!(layout.price().unwrap().height, total - indicator_sum);
            for pair in layout.bands.windows(2) {
                prop_assert_eq!(pair[0].bottom(), pair[1].top);
            }
        }
    }
}
