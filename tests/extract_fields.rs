use cov_check::{
    extract::{extract_field, Direction},
    report::DefectReport,
};

const PAGE: &str = include_str!("fixtures/project_page.html");

#[test]
fn cell_before_label() {
    let html = "<td>42</td><td>Outstanding</td>";
    let v = extract_field(html, "Outstanding", Direction::Before);
    assert_eq!(v.as_deref(), Some("42"));
}

#[test]
fn cell_after_label() {
    let html = "<tr><td>Last build analyzed</td><td>\n 5 hours ago\n</td></tr>";
    let v = extract_field(html, "Last build analyzed", Direction::After);
    assert_eq!(v.as_deref(), Some("5 hours ago"));
}

#[test]
fn absent_label_is_none() {
    let v = extract_field(PAGE, "Unresolved", Direction::Before);
    assert_eq!(v, None);
}

#[test]
fn full_project_page() {
    let r = DefectReport::from_html(PAGE);
    assert_eq!(r.last_analyzed.as_deref(), Some("Oct 17, 2026"));
    assert_eq!(r.lines_of_code_analyzed, Some(182_377));
    assert_eq!(r.defect_density.as_deref(), Some("0.08"));
    assert_eq!(r.outstanding, Some(15));
    assert_eq!(r.fixed, Some(1204));
    assert_eq!(r.newly_detected, Some(2));
    assert_eq!(r.eliminated, Some(3));
    assert_eq!(r.last_build_analyzed.as_deref(), Some("3 days ago"));
}

#[test]
fn unrelated_page_yields_unknowns() {
    let r = DefectReport::from_html("<html><body><p>Project not found</p></body></html>");
    assert_eq!(r, DefectReport::default());
    assert_eq!(r.outstanding, None);
}

#[test]
fn non_numeric_count_is_unknown_not_zero() {
    let r = DefectReport::from_html("<td>n/a</td><td>Outstanding</td>");
    assert_eq!(r.outstanding, None);
}
