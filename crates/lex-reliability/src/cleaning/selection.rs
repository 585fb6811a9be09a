//! Choosing the best cleaning configuration.
//!
//! Outcomes are ranked by data loss alone. The reliability score of each
//! cleaned dataset is reported next to the choice but does not influence it.

/// Loss score for a data-loss percentage: 10, 7, 4 or 1.
pub fn loss_score(data_loss_pct: f64) -> u8 {
    if data_loss_pct < 5.0 {
        10
    } else if data_loss_pct < 10.0 {
        7
    } else if data_loss_pct < 15.0 {
        4
    } else {
        1
    }
}

/// Index of the first outcome with the strictly highest loss score.
///
/// Ties keep the earlier entry, so the result depends only on input order.
pub fn select_best(data_loss_pcts: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (index, loss) in data_loss_pcts.into_iter().enumerate() {
        let score = loss_score(loss);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}
