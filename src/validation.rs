//! Validation of instance parameters coming from the command line.
//!
//! The heuristics and the generator trust their inputs; these checks run before
//! them. The `parse_*` functions double as clap value parsers.

/// A valid number of points: an integer `>= 2`
pub fn parse_n(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("invalid int value: '{}'", s))?;
    if n < 2 {
        return Err("must be at least 2".to_string());
    }
    Ok(n)
}

/// A decimal percentage in `[0, 1]`
pub fn parse_percentage(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("invalid float value: '{}'", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("invalid decimal percentage: {}", value));
    }
    Ok(value)
}

/// An integer `> 0`
pub fn parse_positive_int(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("invalid int value: '{}'", s))?;
    if value == 0 {
        return Err("invalid positive int value (> 0): 0".to_string());
    }
    Ok(value)
}

/// Number of points to select: `floor(percentage * n)`
pub fn selection_size(n: usize, percentage: f64) -> usize {
    (percentage * n as f64).floor() as usize
}

pub fn validate_p(n: usize, p: usize) -> Result<(), String> {
    if p < 2 {
        return Err(format!("p = {} is too small, at least 2 points must be selected", p));
    }
    if p > n {
        return Err(format!("p = {} exceeds the number of points n = {}", p, n));
    }
    Ok(())
}

/// The plane must have room for `n` points: `x_max * y_max >= n`
pub fn validate_dimensions(n: usize, x_max: i64, y_max: i64) -> Result<(), String> {
    if x_max < 0 || y_max < 0 {
        return Err(format!("dimensions must be non-negative, got {} x {}", x_max, y_max));
    }
    let area = (x_max as u128) * (y_max as u128);
    if area < n as u128 {
        return Err(format!(
            "a {} x {} plane has no room for {} distinct points",
            x_max, y_max, n
        ));
    }
    Ok(())
}

/// Every precondition of random instance generation
pub fn validate_parameters(n: usize, p: usize, x_max: i64, y_max: i64) -> Result<(), String> {
    if n < 2 {
        return Err(format!("n = {} must be at least 2", n));
    }
    validate_p(n, p)?;
    validate_dimensions(n, x_max, y_max)
}
