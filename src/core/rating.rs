//! Purpose: Rating aggregation business rule.
//! Exports: `validate`, `fold`.
//! Role: Pure arithmetic; the range check belongs to the request boundary,
//! the table itself has no rating-range opinion.

use crate::core::error::{Error, ErrorKind};

/// Ratings must fall in `[0, 5]`; anything else is rejected before the
/// arithmetic runs.
pub fn validate(rating: f64) -> Result<(), Error> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(Error::new(ErrorKind::InvalidInput)
            .with_message(format!("rating {rating} is outside the allowed range"))
            .with_hint("Ratings must be between 0 and 5."));
    }
    Ok(())
}

/// Fold a new rating into a running average.
pub fn fold(average: f64, count: u64, rating: f64) -> (f64, u64) {
    let total = average * count as f64 + rating;
    let new_count = count + 1;
    (total / new_count as f64, new_count)
}

#[cfg(test)]
mod tests {
    use super::{fold, validate};
    use crate::core::error::ErrorKind;

    #[test]
    fn folds_into_running_average() {
        // average=3, count=2, new rating=5 -> (3*2+5)/3
        let (average, count) = fold(3.0, 2, 5.0);
        assert!((average - 11.0 / 3.0).abs() < 1e-12);
        assert_eq!(count, 3);
    }

    #[test]
    fn first_rating_becomes_the_average() {
        let (average, count) = fold(0.0, 0, 4.0);
        assert_eq!(average, 4.0);
        assert_eq!(count, 1);
    }

    #[test]
    fn bounds_are_inclusive() {
        validate(0.0).unwrap();
        validate(5.0).unwrap();
        assert_eq!(validate(6.0).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(validate(-1.0).unwrap_err().kind(), ErrorKind::InvalidInput);
    }
}
