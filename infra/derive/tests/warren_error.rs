#[test]
fn warren_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/warren_error_pass.rs");
}
