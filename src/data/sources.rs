use crate::data::case::Case;
use crate::error::{Error, Result};
use rand::Rng;
use std::fs;
use std::path::Path;

pub const SOURCE_NAMES: &[&str] = &[
    "<filename>.txt",
    "parity",
    "symmetry",
    "auto_onehot",
    "auto_dense",
    "bitcounter",
    "segmentcounter",
];

/// Builds the full case collection for a named source.
///
/// `params` tunes the generator (counts, vector lengths); each source has
/// defaults when the list is empty. A `.txt` source is parsed from disk:
/// `[;,]`-separated floats per line, the last field a 1-based class label,
/// `?` reading as 0, inputs min-max normalized per column.
pub fn load<R: Rng>(source: &str, params: &[usize], rng: &mut R) -> Result<Vec<Case>> {
    let cases = if source.ends_with(".txt") {
        parse_txt(Path::new(source))?
    } else {
        match source {
            "parity" => all_parity_cases(param(params, 0, 10)),
            "symmetry" => symmetry_cases(param(params, 0, 101), param(params, 1, 2000), rng),
            "auto_onehot" => all_one_hot_cases(param(params, 0, 64)),
            "auto_dense" => dense_autoencoder_cases(param(params, 0, 2000), param(params, 1, 100), rng),
            "bitcounter" => bit_count_cases(param(params, 0, 500), param(params, 1, 15), rng),
            "segmentcounter" => segment_count_cases(
                param(params, 0, 25),
                param(params, 1, 1000),
                param(params, 2, 0),
                param(params, 3, 8),
                rng,
            )?,
            other => {
                return Err(Error::Data(format!(
                    "'{}' is illegal for the data source; legal values are: {}",
                    other,
                    SOURCE_NAMES.join(", ")
                )))
            }
        }
    };

    if cases.is_empty() {
        return Err(Error::Data(format!(
            "source '{}' produced no cases; legal values are: {}",
            source,
            SOURCE_NAMES.join(", ")
        )));
    }
    Ok(cases)
}

fn param(params: &[usize], index: usize, default: usize) -> usize {
    params.get(index).copied().unwrap_or(default)
}

/// All 2^nbits bit vectors, target one-hot over even/odd parity.
fn all_parity_cases(nbits: usize) -> Vec<Case> {
    (0..1usize << nbits)
        .map(|value| {
            let input: Vec<f64> = (0..nbits)
                .map(|bit| ((value >> bit) & 1) as f64)
                .collect();
            let parity = value.count_ones() as usize % 2;
            Case::new(input, int_to_one_hot(parity, 2))
        })
        .collect()
}

/// Random bit vectors, roughly half forced symmetric; target one-hot over
/// asymmetric/symmetric.
fn symmetry_cases<R: Rng>(vlen: usize, count: usize, rng: &mut R) -> Vec<Case> {
    (0..count)
        .map(|_| {
            let mut bits: Vec<f64> = (0..vlen).map(|_| rng.gen_range(0..2) as f64).collect();
            if rng.gen_bool(0.5) {
                for i in 0..vlen / 2 {
                    bits[vlen - 1 - i] = bits[i];
                }
            }
            let symmetric = (0..vlen / 2).all(|i| bits[i] == bits[vlen - 1 - i]);
            Case::new(bits, int_to_one_hot(symmetric as usize, 2))
        })
        .collect()
}

/// Identity one-hot autoencoder cases: target == input.
fn all_one_hot_cases(len: usize) -> Vec<Case> {
    (0..len)
        .map(|i| {
            let v = int_to_one_hot(i, len);
            Case::new(v.clone(), v)
        })
        .collect()
}

/// Dense random vectors in [0, 1); target == input.
fn dense_autoencoder_cases<R: Rng>(count: usize, size: usize, rng: &mut R) -> Vec<Case> {
    (0..count)
        .map(|_| {
            let v: Vec<f64> = (0..size).map(|_| rng.gen::<f64>()).collect();
            Case::new(v.clone(), v)
        })
        .collect()
}

/// Random bit vectors, target one-hot over the popcount (size + 1 classes).
fn bit_count_cases<R: Rng>(count: usize, nbits: usize, rng: &mut R) -> Vec<Case> {
    (0..count)
        .map(|_| {
            let bits: Vec<f64> = (0..nbits).map(|_| rng.gen_range(0..2) as f64).collect();
            let ones = bits.iter().filter(|&&b| b == 1.0).count();
            Case::new(bits, int_to_one_hot(ones, nbits + 1))
        })
        .collect()
}

/// Bit vectors with exactly k runs of ones, k uniform in [minsegs, maxsegs];
/// target one-hot over the run count.
fn segment_count_cases<R: Rng>(
    size: usize,
    count: usize,
    minsegs: usize,
    maxsegs: usize,
    rng: &mut R,
) -> Result<Vec<Case>> {
    if minsegs > maxsegs || maxsegs > (size + 1) / 2 {
        return Err(Error::Config(format!(
            "segment range [{}, {}] does not fit a vector of length {}",
            minsegs, maxsegs, size
        )));
    }
    let classes = maxsegs - minsegs + 1;
    Ok((0..count)
        .map(|_| {
            let k = rng.gen_range(minsegs..=maxsegs);
            let bits = vector_with_segments(size, k, rng);
            Case::new(bits, int_to_one_hot(k - minsegs, classes))
        })
        .collect())
}

/// Builds a bit vector of `size` with exactly `k` runs of ones separated by
/// at least one zero. Starts from the minimal layout (k single ones with
/// single-zero gaps) and sprinkles the slack positions at random.
fn vector_with_segments<R: Rng>(size: usize, k: usize, rng: &mut R) -> Vec<f64> {
    if k == 0 {
        return vec![0.0; size];
    }
    // Slots: gap, run, gap, run, ..., gap. Interior gaps start at 1.
    let mut runs = vec![1usize; k];
    let mut gaps = vec![0usize; k + 1];
    for gap in gaps.iter_mut().take(k).skip(1) {
        *gap = 1;
    }
    let mut slack = size - (2 * k - 1);
    while slack > 0 {
        let slot = rng.gen_range(0..2 * k + 1);
        if slot < k {
            runs[slot] += 1;
        } else {
            gaps[slot - k] += 1;
        }
        slack -= 1;
    }
    let mut bits = Vec::with_capacity(size);
    for i in 0..k {
        bits.extend(std::iter::repeat(0.0).take(gaps[i]));
        bits.extend(std::iter::repeat(1.0).take(runs[i]));
    }
    bits.extend(std::iter::repeat(0.0).take(gaps[k]));
    bits
}

fn int_to_one_hot(index: usize, size: usize) -> Vec<f64> {
    let mut v = vec![0.0; size];
    v[index] = 1.0;
    v
}

/// Text datasets: one case per line, fields split on ';' or ',', the last
/// field a 1-based class label. Inputs are min-max normalized per column
/// after parsing.
fn parse_txt(path: &Path) -> Result<Vec<Case>> {
    let text = fs::read_to_string(path).map_err(|err| {
        Error::Data(format!("could not read '{}': {}", path.display(), err))
    })?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let row: Vec<f64> = line
            .split(|c| c == ';' || c == ',')
            .map(|field| {
                let field = field.trim();
                // '?' marks a missing value and reads as 0.
                if field == "?" {
                    Ok(0.0)
                } else {
                    field.parse::<f64>().map_err(|_| {
                        Error::Data(format!("unparseable field '{}' in {}", field, path.display()))
                    })
                }
            })
            .collect::<Result<_>>()?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Ok(vec![]);
    }
    if rows.iter().any(|r| r.len() != rows[0].len() || r.len() < 2) {
        return Err(Error::Data(format!(
            "inconsistent field counts in '{}'; every line needs the same number of inputs plus a class label",
            path.display()
        )));
    }

    let classes = rows
        .iter()
        .map(|r| *r.last().unwrap_or(&0.0) as usize)
        .max()
        .unwrap_or(0);
    if classes == 0 {
        return Err(Error::Data(format!(
            "no positive class labels found in '{}'; the last field of each line must be a 1-based class",
            path.display()
        )));
    }

    let width = rows[0].len() - 1;
    let mut mins = vec![f64::INFINITY; width];
    let mut maxs = vec![f64::NEG_INFINITY; width];
    for row in &rows {
        for j in 0..width {
            mins[j] = mins[j].min(row[j]);
            maxs[j] = maxs[j].max(row[j]);
        }
    }

    rows.into_iter()
        .map(|row| {
            let class = *row.last().unwrap() as usize;
            if class == 0 {
                return Err(Error::Data(format!(
                    "class label 0 in '{}'; labels are 1-based",
                    path.display()
                )));
            }
            let input = row[..width]
                .iter()
                .enumerate()
                .map(|(j, &v)| {
                    let span = maxs[j] - mins[j];
                    if span == 0.0 {
                        0.0
                    } else {
                        (v - mins[j]) / span
                    }
                })
                .collect();
            Ok(Case::new(input, int_to_one_hot(class - 1, classes)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parity_enumerates_all_vectors() {
        let mut rng = StdRng::seed_from_u64(1);
        let cases = load("parity", &[4], &mut rng).unwrap();
        assert_eq!(cases.len(), 16);
        // 0b0000 has even parity.
        assert_eq!(cases[0].target, vec![1.0, 0.0]);
        // 0b0001 has odd parity.
        assert_eq!(cases[1].target, vec![0.0, 1.0]);
    }

    #[test]
    fn auto_onehot_targets_equal_inputs() {
        let mut rng = StdRng::seed_from_u64(2);
        let cases = load("auto_onehot", &[8], &mut rng).unwrap();
        assert_eq!(cases.len(), 8);
        assert!(cases.iter().all(|c| c.input == c.target));
    }

    #[test]
    fn bitcounter_target_is_popcount_one_hot() {
        let mut rng = StdRng::seed_from_u64(3);
        let cases = load("bitcounter", &[50, 8], &mut rng).unwrap();
        for case in &cases {
            let ones = case.input.iter().filter(|&&b| b == 1.0).count();
            assert_eq!(case.target.len(), 9);
            assert_eq!(case.target[ones], 1.0);
        }
    }

    #[test]
    fn segmentcounter_builds_exact_run_counts() {
        let mut rng = StdRng::seed_from_u64(4);
        let cases = load("segmentcounter", &[25, 100, 0, 8], &mut rng).unwrap();
        for case in &cases {
            let mut runs = 0;
            let mut prev = 0.0;
            for &b in &case.input {
                if b == 1.0 && prev == 0.0 {
                    runs += 1;
                }
                prev = b;
            }
            assert_eq!(case.input.len(), 25);
            assert_eq!(case.target[runs], 1.0);
        }
    }

    #[test]
    fn symmetry_labels_match_the_vector() {
        let mut rng = StdRng::seed_from_u64(5);
        let cases = load("symmetry", &[11, 200], &mut rng).unwrap();
        for case in &cases {
            let n = case.input.len();
            let symmetric = (0..n / 2).all(|i| case.input[i] == case.input[n - 1 - i]);
            assert_eq!(case.target[symmetric as usize], 1.0);
        }
    }

    #[test]
    fn unknown_source_is_data_error_listing_legal_values() {
        let mut rng = StdRng::seed_from_u64(6);
        let err = load("cifar", &[], &mut rng).unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert!(err.to_string().contains("segmentcounter"));
    }

    #[test]
    fn txt_parsing_normalizes_and_one_hots() {
        let dir = std::env::temp_dir().join("gantry-sources-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("toy.txt");
        std::fs::write(&path, "0,10,1\n5,?,2\n10,30,2\n").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let cases = load(path.to_str().unwrap(), &[], &mut rng).unwrap();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].input, vec![0.0, 1.0 / 3.0]);
        // '?' read as 0 before normalization, which is the column minimum.
        assert_eq!(cases[1].input, vec![0.5, 0.0]);
        assert_eq!(cases[0].target, vec![1.0, 0.0]);
        assert_eq!(cases[2].target, vec![0.0, 1.0]);
    }
}
