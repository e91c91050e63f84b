use std::cmp::Ordering;
use std::fmt;

/// One ranked class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub score: f32,
    pub class_index: usize,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} #{}", self.score, self.class_index)
    }
}

/// The `k` best entries of `row`, highest score first.
///
/// Equal scores keep ascending index order and NaN ranks below every number,
/// so the result is the same on every call.
pub fn top_k(row: &[f32], k: usize) -> Vec<Prediction> {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| descending(row[a], row[b]).then(a.cmp(&b)));
    order.truncate(k);
    order
        .into_iter()
        .map(|class_index| Prediction {
            score: row[class_index],
            class_index,
        })
        .collect()
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
