use crate::domain::model::{BenchmarkDataset, RatioResult};
use crate::utils::error::{RelPerfError, Result};

/// Rounds to two decimals, ties to even (`2.125 * 100 = 212.5 -> 212`).
pub fn round_ratio(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Joins detected names against the dataset and divides every score by the
/// smallest one. Names must match a dataset key exactly.
pub fn compute_ratios<I, S>(names: I, dataset: &BenchmarkDataset) -> Result<Vec<RatioResult>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut matched: Vec<(String, u64)> = Vec::new();
    let mut min: Option<(usize, u64)> = None;

    for name in names {
        let name = name.as_ref();
        let score = dataset
            .score(name)
            .ok_or_else(|| RelPerfError::UnknownDeviceError {
                name: name.to_string(),
            })?;

        if min.map_or(true, |(_, current)| score < current) {
            min = Some((matched.len(), score));
            tracing::info!("\tMatched entry from dataset: {} for tag: {}", score, name);
        } else {
            tracing::debug!("\tMatched entry from dataset: {} for tag: {}", score, name);
        }
        matched.push((name.to_string(), score));
    }

    let Some((min_index, min_score)) = min else {
        return Ok(Vec::new());
    };

    if min_score == 0 {
        return Err(RelPerfError::InvalidScoreError {
            name: matched[min_index].0.clone(),
            score: min_score,
        });
    }

    tracing::info!("Calculating card ratios:");
    let results = matched
        .into_iter()
        .enumerate()
        .map(|(index, (name, score))| {
            let ratio = round_ratio(score as f64 / min_score as f64);
            tracing::info!("\tCard index: {}, Name: {}, Ratio: {:.2}", index, name, ratio);
            RatioResult { name, score, ratio }
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::BenchmarkEntry;
    use chrono::Utc;

    fn dataset(entries: &[(&str, u64)]) -> BenchmarkDataset {
        BenchmarkDataset::from_entries(
            entries.iter().map(|(name, score)| BenchmarkEntry {
                name: name.to_string(),
                score: *score,
            }),
            Utc::now(),
        )
    }

    #[test]
    fn test_ratios_keep_detection_order() {
        let data = dataset(&[("A", 100), ("B", 50), ("C", 200)]);
        let results = compute_ratios(["B", "A", "C"], &data).unwrap();

        let expected = vec![
            RatioResult {
                name: "B".to_string(),
                score: 50,
                ratio: 1.00,
            },
            RatioResult {
                name: "A".to_string(),
                score: 100,
                ratio: 2.00,
            },
            RatioResult {
                name: "C".to_string(),
                score: 200,
                ratio: 4.00,
            },
        ];
        assert_eq!(results, expected);
    }

    #[test]
    fn test_single_device_has_unit_ratio() {
        let data = dataset(&[("GeForce RTX 4090", 321_145)]);
        let results = compute_ratios(["GeForce RTX 4090"], &data).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ratio, 1.00);
    }

    #[test]
    fn test_minimum_is_one_and_all_at_least_one() {
        let data = dataset(&[("A", 7_919), ("B", 12_345), ("C", 33_333), ("D", 7_920)]);
        let results = compute_ratios(["C", "D", "A", "B", "A"], &data).unwrap();

        let min = results.iter().map(|r| r.ratio).fold(f64::INFINITY, f64::min);
        assert_eq!(min, 1.00);
        assert!(results.iter().all(|r| r.ratio >= 1.00));
    }

    #[test]
    fn test_recomputing_gives_identical_results() {
        let data = dataset(&[("A", 3), ("B", 7), ("C", 11)]);
        let first = compute_ratios(["C", "A", "B"], &data).unwrap();
        let second = compute_ratios(["C", "A", "B"], &data).unwrap();

        assert_eq!(first, second);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.ratio.to_bits(), b.ratio.to_bits());
        }
    }

    #[test]
    fn test_no_devices_is_empty_not_error() {
        let data = dataset(&[("A", 100)]);
        let results = compute_ratios(Vec::<String>::new(), &data).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_unknown_device_fails_without_partial_output() {
        let data = dataset(&[("A", 100)]);
        match compute_ratios(["A", "Quadro K2200"], &data) {
            Err(RelPerfError::UnknownDeviceError { name }) => assert_eq!(name, "Quadro K2200"),
            other => panic!("expected UnknownDeviceError, got {:?}", other),
        }
    }

    #[test]
    fn test_match_is_case_and_whitespace_sensitive() {
        let data = dataset(&[("TITAN V", 100)]);
        assert!(compute_ratios(["Titan V"], &data).is_err());
        assert!(compute_ratios(["TITAN  V"], &data).is_err());
    }

    #[test]
    fn test_zero_minimum_score_is_rejected() {
        let data = dataset(&[("A", 100), ("Broken", 0)]);
        match compute_ratios(["A", "Broken"], &data) {
            Err(RelPerfError::InvalidScoreError { name, score }) => {
                assert_eq!(name, "Broken");
                assert_eq!(score, 0);
            }
            other => panic!("expected InvalidScoreError, got {:?}", other),
        }
    }

    #[test]
    fn test_round_ratio() {
        assert_eq!(round_ratio(1.0), 1.0);
        assert_eq!(round_ratio(2.0 / 3.0), 0.67);
        assert_eq!(round_ratio(1.234), 1.23);
        assert_eq!(round_ratio(1.236), 1.24);
        // 0.5 ties go to the even neighbour
        assert_eq!(round_ratio(2.125), 2.12);
        assert_eq!(round_ratio(2.375), 2.38);
    }

    #[test]
    fn test_non_integral_ratio() {
        let data = dataset(&[("Slow", 3), ("Fast", 10)]);
        let results = compute_ratios(["Fast", "Slow"], &data).unwrap();
        assert_eq!(results[0].ratio, 3.33);
        assert_eq!(results[1].ratio, 1.00);
    }
}
