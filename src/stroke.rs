use crate::types::split_comma_wsp;
use crate::units::PixelContext;

const NEGATIVE_DASH_WARNING: &str =
    "stroke-dasharray cannot have negative numbers; treating as 'none'";

/// Resolved `stroke-dasharray`.
#[derive(Debug, Clone, PartialEq)]
pub enum DashArray {
    /// Keep whatever the parent set.
    Inherit,
    /// Solid stroke.
    None,
    Dashes(Vec<f64>),
}

/// Parses `stroke-dasharray`, resolving each entry against the viewport
/// diagonal.
///
/// Odd-length lists repeat once to make the pattern even. A negative entry
/// warns and disables dashing; so does a pattern that sums to zero.
pub fn parse_dash_array(value: &str, ctx: &PixelContext, warnings: &mut Vec<String>) -> DashArray {
    match value.trim() {
        "inherit" => return DashArray::Inherit,
        "none" => return DashArray::None,
        _ => {}
    }

    let mut dashes: Vec<f64> = split_comma_wsp(value).map(|v| ctx.pixels(v)).collect();
    if dashes.len() % 2 == 1 {
        dashes.extend_from_within(..);
    }

    if dashes.iter().any(|d| *d < 0.0) {
        log::warn!("{NEGATIVE_DASH_WARNING}");
        warnings.push(NEGATIVE_DASH_WARNING.to_string());
        return DashArray::None;
    }
    if dashes.iter().sum::<f64>() == 0.0 {
        return DashArray::None;
    }
    DashArray::Dashes(dashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PixelContext {
        PixelContext {
            viewport_width: 300.0,
            viewport_height: 400.0,
            viewport_diagonal: 200.0,
            document_height: 400.0,
            font_size: 10.0,
        }
    }

    fn parse(value: &str) -> (DashArray, Vec<String>) {
        let mut warnings = Vec::new();
        (parse_dash_array(value, &ctx(), &mut warnings), warnings)
    }

    #[test]
    fn keywords() {
        assert_eq!(parse("inherit").0, DashArray::Inherit);
        assert_eq!(parse(" none ").0, DashArray::None);
    }

    #[test]
    fn odd_lists_are_doubled() {
        assert_eq!(
            parse("5, 10 15").0,
            DashArray::Dashes(vec![5.0, 10.0, 15.0, 5.0, 10.0, 15.0])
        );
        assert_eq!(parse("4 2").0, DashArray::Dashes(vec![4.0, 2.0]));
    }

    #[test]
    fn entries_resolve_units() {
        assert_eq!(parse("1em 10%").0, DashArray::Dashes(vec![10.0, 20.0]));
    }

    #[test]
    fn negative_entries_warn_and_disable_dashing() {
        let (dashes, warnings) = parse("3 -1");
        assert_eq!(dashes, DashArray::None);
        assert_eq!(warnings, [NEGATIVE_DASH_WARNING]);
    }

    #[test]
    fn zero_patterns_are_solid() {
        let (dashes, warnings) = parse("0 0 0");
        assert_eq!(dashes, DashArray::None);
        assert!(warnings.is_empty());
        assert_eq!(parse("").0, DashArray::None);
    }
}
