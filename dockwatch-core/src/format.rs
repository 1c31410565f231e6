//! Display formatting shared by every output surface.

/// `"{h}ч {m}мин"` when there is at least one full hour, else `"{m}мин"`.
pub fn format_minutes(minutes: i64) -> String {
    let h = minutes / 60;
    let m = minutes % 60;
    if h > 0 {
        format!("{h}ч {m}мин")
    } else {
        format!("{m}мин")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_outputs() {
        assert_eq!(format_minutes(0), "0мин");
        assert_eq!(format_minutes(59), "59мин");
        assert_eq!(format_minutes(60), "1ч 0мин");
        assert_eq!(format_minutes(125), "2ч 5мин");
        assert_eq!(format_minutes(1439), "23ч 59мин");
    }
}
