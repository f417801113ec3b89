// src/utils/fixed_point.rs
pub const NODATA_VALUE_FLOAT: f32 = -999.0;
pub const NODATA_VALUE_INT: i16 = -10000;

/// Scale an index in [-1, 1] to int16. NaN and the float nodata value map to `nodata_value`.
pub fn to_fixed_point(data: &[f32], scale_factor: i32, nodata_value: i16) -> Vec<i16> {
    data.iter()
        .map(|&value| {
            if value.is_nan() || value == NODATA_VALUE_FLOAT {
                nodata_value
            } else {
                // Clamp to avoid overflow and scale
                let clamped = value.clamp(-0.9999, 0.9999);
                (clamped * scale_factor as f32).round() as i16
            }
        })
        .collect()
}

/// Float output keeps values but swaps NaN for the nodata marker
pub fn fill_nodata(data: &[f32]) -> Vec<f32> {
    data.iter()
        .map(|&value| if value.is_nan() { NODATA_VALUE_FLOAT } else { value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_and_clamps() {
        let fixed = to_fixed_point(&[0.25, -1.0, 1.0, f32::NAN, -999.0], 10000, NODATA_VALUE_INT);
        assert_eq!(fixed, vec![2500, -9999, 9999, -10000, -10000]);
    }

    #[test]
    fn nan_becomes_float_nodata() {
        assert_eq!(fill_nodata(&[0.5, f32::NAN]), vec![0.5, -999.0]);
    }
}
