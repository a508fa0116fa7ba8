//! Section visibility as a pure function of the selected loan product.

use sacco_types::{LoanProduct, Section};

/// Ordered sections enabled for `product`.
///
/// Basic info is always first. Without a selected product no repeatable
/// section is visible.
pub fn visible_sections(product: Option<&LoanProduct>) -> Vec<Section> {
    let mut sections = vec![Section::BasicInfo];
    if let Some(product) = product {
        sections.extend(Section::REPEATABLE.iter().copied().filter(|section| product.requires(*section)));
    }
    sections
}

/// Keep `current` if it is still visible, otherwise fall back to basic info.
pub fn reconcile_section(current: Section, visible: &[Section]) -> Section {
    if visible.contains(&current) {
        current
    } else {
        Section::BasicInfo
    }
}
