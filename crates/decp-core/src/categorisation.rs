//! Contract category from a CPV code.
//!
//! The CPV division (first two digits) decides: division 45 is construction
//! work, divisions 50 and above are services, everything else is supplies.

use crate::enums::Category;

const WORKS_DIVISION: &str = "45";
const FIRST_SERVICES_DIVISION: u8 = 50;

/// Classify a CPV code (`"45000000-7"`, `"30200000"`, ...).
///
/// The code is expected to have passed schema validation; a prefix that is not
/// two digits falls back to `Supplies`.
#[must_use]
pub fn cpv_to_category(cpv: &str) -> Category {
    let Some(division) = cpv.get(..2) else {
        return Category::Supplies;
    };
    if division == WORKS_DIVISION {
        return Category::Works;
    }
    match division.parse::<u8>() {
        Ok(d) if d >= FIRST_SERVICES_DIVISION => Category::Services,
        _ => Category::Supplies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("45000000-7", Category::Works)]
    #[case("45200000-9", Category::Works)]
    #[case("45000000", Category::Works)]
    #[case("30200000-1", Category::Supplies)]
    #[case("33600000-6", Category::Supplies)]
    #[case("49999999", Category::Supplies)]
    #[case("44000000-0", Category::Supplies)]
    #[case("03000000-1", Category::Supplies)]
    #[case("50000000", Category::Services)]
    #[case("60100000-9", Category::Services)]
    #[case("79400000-8", Category::Services)]
    #[case("98000000-3", Category::Services)]
    fn classifies_by_division(#[case] cpv: &str, #[case] expected: Category) {
        assert_eq!(cpv_to_category(cpv), expected);
    }

    #[test]
    fn malformed_prefix_is_supplies() {
        assert_eq!(cpv_to_category(""), Category::Supplies);
        assert_eq!(cpv_to_category("x1"), Category::Supplies);
    }
}
