//! Declarative response-index → display-field bindings.

use crate::models::method::{MethodSpec, ValueParser};

/// "Take `source` from each point of `data[response_index]`, run it through
/// `parser`, and store it as `field`."
#[derive(Clone, Debug)]
pub struct FieldBinding {
    pub response_index: usize,
    pub field: String,
    pub source: String,
    pub parser: ValueParser,
}

/// Derive the bindings for a method sequence. The bar series contributes
/// none; every indicator output contributes one, at its method's index.
pub fn bindings_for(methods: &[MethodSpec]) -> Vec<FieldBinding> {
    methods
        .iter()
        .enumerate()
        .filter_map(|(index, method)| match method {
            MethodSpec::TimeSeries => None,
            MethodSpec::Indicator(job) => Some((index, job)),
        })
        .flat_map(|(index, job)| {
            job.outputs.iter().map(move |out| FieldBinding {
                response_index: index,
                field: out.field.clone(),
                source: out.source.clone(),
                parser: out.parser,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::method::{IndicatorJob, fields};

    #[test]
    fn indices_follow_method_positions() {
        let methods = vec![
            MethodSpec::TimeSeries,
            MethodSpec::Indicator(IndicatorJob::ichimoku(9, 26, 52, 26)),
            MethodSpec::Indicator(IndicatorJob::macd(12, 26, 9)),
            MethodSpec::Indicator(IndicatorJob::atr(14)),
        ];
        let bindings = bindings_for(&methods);
        let bound: Vec<(usize, &str, &str)> = bindings
            .iter()
            .map(|b| (b.response_index, b.field.as_str(), b.source.as_str()))
            .collect();
        assert_eq!(
            bound,
            [
                (1, fields::ICHIMOKU, "senkou_span_a"),
                (2, fields::TREND_UP, "macd_hist"),
                (2, fields::TREND_DOWN, "macd_hist"),
                (3, fields::ATR, "atr"),
            ]
        );
    }

    #[test]
    fn bars_only_has_no_bindings() {
        assert!(bindings_for(&[MethodSpec::TimeSeries]).is_empty());
    }

    #[test]
    fn job_without_outputs_is_fetched_but_not_bound() {
        let methods = vec![
            MethodSpec::TimeSeries,
            MethodSpec::Indicator(IndicatorJob::custom("obv")),
            MethodSpec::Indicator(IndicatorJob::atr(14)),
        ];
        let bindings = bindings_for(&methods);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].response_index, 2);
    }
}
