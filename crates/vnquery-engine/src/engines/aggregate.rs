//! Scalar reductions over one bar column.

use vnquery_core::{Aggregate, BarField, QueryError, Result, Series};

/// Reduce one column of a series to a scalar.
///
/// Any field and operation may be paired; nothing restricts, say, the mean
/// of volume. `EmptySeries` when the series holds no bars, which callers
/// can surface or degrade per ticker.
pub fn aggregate(series: &Series, field: BarField, op: Aggregate) -> Result<f64> {
    if series.is_empty() {
        return Err(QueryError::EmptySeries {
            ticker: series.ticker.clone(),
        });
    }

    let values = series.values(field);
    let value = match op {
        Aggregate::Sum => values.iter().sum(),
        Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Aggregate::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::bar;
    use vnquery_core::Interval;

    fn series() -> Series {
        Series::new(
            "VIC",
            Interval::OneDay,
            vec![
                bar(20, 41.0, 42.5, 40.0, 42.0, 100),
                bar(21, 42.0, 43.0, 41.5, 41.8, 200),
                bar(22, 41.8, 44.0, 41.0, 43.5, 300),
            ],
        )
    }

    #[test]
    fn test_sum_of_volume() {
        let total = aggregate(&series(), BarField::Volume, Aggregate::Sum).unwrap();
        assert_eq!(total, 600.0);
    }

    #[test]
    fn test_min_and_max_of_close() {
        let s = series();
        assert_eq!(aggregate(&s, BarField::Close, Aggregate::Min).unwrap(), 41.8);
        assert_eq!(aggregate(&s, BarField::Close, Aggregate::Max).unwrap(), 43.5);
    }

    #[test]
    fn test_mean_of_high() {
        let mean = aggregate(&series(), BarField::High, Aggregate::Mean).unwrap();
        assert!((mean - 43.166_666).abs() < 1e-4);
    }

    #[test]
    fn test_any_field_op_pairing_is_legal() {
        // Mean volume is an odd question but a valid one.
        let mean = aggregate(&series(), BarField::Volume, Aggregate::Mean).unwrap();
        assert_eq!(mean, 200.0);
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let empty = Series::new("VIC", Interval::OneDay, vec![]);
        let err = aggregate(&empty, BarField::Close, Aggregate::Sum).unwrap_err();
        assert!(err.to_string().contains("no data"));
    }
}
