use crate::errors::ValidationError;

/// One size-bounded, ordered slice of the full identifier list.
/// Inserted and committed as a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierBatch {
    /// Zero-based position of this batch within the submission.
    pub index: usize,
    pub identifiers: Vec<String>,
}

/// Splits `identifiers` into ordered, non-overlapping chunks of at most
/// `batch_size` entries. The chunks partition the input: concatenating them
/// reproduces the original sequence. Only the last chunk may be shorter.
///
/// An empty input yields zero batches; `batch_size` of zero is rejected.
pub fn plan(identifiers: &[String], batch_size: usize) -> Result<Vec<IdentifierBatch>, ValidationError> {
    if batch_size == 0 {
        return Err(ValidationError::BatchSize {
            value: "0".to_string(),
        });
    }

    Ok(identifiers
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| IdentifierBatch {
            index,
            identifiers: chunk.to_vec(),
        })
        .collect())
}

/// Parses a caller-supplied batch size field. Non-numeric or non-positive
/// input is a validation error, never coerced to a default.
pub fn parse_batch_size(value: &str) -> Result<usize, ValidationError> {
    match value.trim().parse::<i64>() {
        Ok(size) if size > 0 => Ok(size as usize),
        _ => Err(ValidationError::BatchSize {
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_five_ids_batch_size_two() {
        let batches = plan(&ids(&["A", "B", "C", "D", "E"]), 2).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].identifiers, ids(&["A", "B"]));
        assert_eq!(batches[1].identifiers, ids(&["C", "D"]));
        assert_eq!(batches[2].identifiers, ids(&["E"]));
        assert_eq!(batches[0].index, 0);
        assert_eq!(batches[2].index, 2);
    }

    #[test]
    fn test_plan_partitions_input() {
        let input = ids(&["a", "b", "c", "d", "e", "f", "g"]);
        for batch_size in 1..=8 {
            let batches = plan(&input, batch_size).unwrap();
            let expected_count = input.len().div_ceil(batch_size);
            assert_eq!(batches.len(), expected_count);

            // Every batch except the last is exactly batch_size long.
            for batch in &batches[..batches.len() - 1] {
                assert_eq!(batch.identifiers.len(), batch_size);
            }
            assert!(batches.last().unwrap().identifiers.len() <= batch_size);

            let reassembled: Vec<String> = batches
                .iter()
                .flat_map(|b| b.identifiers.clone())
                .collect();
            assert_eq!(reassembled, input);
        }
    }

    #[test]
    fn test_plan_empty_input_yields_no_batches() {
        let batches = plan(&[], 10).unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn test_plan_rejects_zero_batch_size() {
        let err = plan(&ids(&["A"]), 0).unwrap_err();
        assert!(matches!(err, ValidationError::BatchSize { .. }));
    }

    #[test]
    fn test_parse_batch_size_valid() {
        assert_eq!(parse_batch_size("100").unwrap(), 100);
        assert_eq!(parse_batch_size(" 5 ").unwrap(), 5);
    }

    #[test]
    fn test_parse_batch_size_rejects_non_numeric() {
        assert!(parse_batch_size("many").is_err());
        assert!(parse_batch_size("").is_err());
        assert!(parse_batch_size("2.5").is_err());
    }

    #[test]
    fn test_parse_batch_size_rejects_non_positive() {
        assert!(parse_batch_size("0").is_err());
        assert!(parse_batch_size("-3").is_err());
    }
}
