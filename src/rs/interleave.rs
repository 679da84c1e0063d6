//! Radix interleaving
//!
//! A byte stream is viewed as a `[columns x radix]` matrix stored row-major;
//! its transpose gives `radix` independent rows. Byte `j * radix + t` of the
//! stream is byte `j` of row `t`, so one stream column of `radix` bytes holds
//! exactly one symbol from every row.

/// Split `data` (length a multiple of `radix`) into `radix` rows
pub fn split_rows(data: &[u8], radix: usize) -> Vec<Vec<u8>> {
    let columns = data.len() / radix;
    let mut rows: Vec<Vec<u8>> = (0..radix).map(|_| Vec::with_capacity(columns)).collect();

    for column in data.chunks_exact(radix) {
        for (row, &byte) in rows.iter_mut().zip(column) {
            row.push(byte);
        }
    }

    rows
}

/// Inverse of [`split_rows`]; rows must share one length
pub fn merge_rows(rows: &[Vec<u8>]) -> Vec<u8> {
    let columns = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut data = Vec::with_capacity(columns * rows.len());

    for j in 0..columns {
        for row in rows {
            data.push(row[j]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rows_transposes() {
        let data: Vec<u8> = (0..12).collect();
        let rows = split_rows(&data, 4);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec![0, 4, 8]);
        assert_eq!(rows[3], vec![3, 7, 11]);
    }

    #[test]
    fn test_merge_rows_restores_order() {
        let data: Vec<u8> = (0..60).collect();
        for radix in [1, 3, 5, 15] {
            assert_eq!(merge_rows(&split_rows(&data, radix)), data, "radix {}", radix);
        }
    }

    #[test]
    fn test_empty_input() {
        let rows = split_rows(&[], 4);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.is_empty()));
        assert!(merge_rows(&rows).is_empty());
    }
}
