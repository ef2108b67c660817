//! Rendering through the public facade.

use expr_engine::Expression;

#[test]
fn test_canonical_text_reparses_to_same_text() {
    for input in [
        "1+2*3",
        "(1+2)*3",
        "sin(x)+cos(y)",
        "{f(x)=x*x}f([p])",
        "sort((3,1,2), false)",
        "Σ(1,10,(1,2,3))",
        "\"a\"+'b'",
        "2i+3",
        "5~!*2",
    ] {
        let first = Expression::new(input);
        assert!(first.is_valid(), "{:?} should parse", input);
        let canonical = first.text();

        let second = Expression::new(&canonical);
        assert!(second.is_valid(), "{:?} should reparse", canonical);
        assert_eq!(second.text(), canonical, "not a fixed point for {:?}", input);
    }
}

#[test]
fn test_latex_output() {
    let expr = Expression::new("(1+2)/2");
    assert_eq!(expr.latex(), "\\frac{1+2}{2}");

    let expr = Expression::new("sin(pi/4)^2");
    let latex = expr.latex();
    assert!(latex.contains("\\sin"), "{}", latex);
    assert!(latex.contains("\\pi"), "{}", latex);

    let expr = Expression::new("cnt(1,2)");
    assert_eq!(expr.latex(), "\\operatorname{cnt}\\left(1,2\\right)");
}

#[test]
fn test_diagram_output() {
    let expr = Expression::new("(1+2)*3");
    let diagram = expr.diagram(0);
    // Left subtree above, operator line, right subtree below.
    let lines: Vec<&str> = diagram.lines().collect();
    assert!(lines.iter().any(|line| line.contains('+')));
    let star = lines
        .iter()
        .position(|line| *line == "*")
        .expect("root line");
    let one = lines.iter().position(|line| line.contains('1')).unwrap();
    let three = lines.iter().position(|line| line.contains('3')).unwrap();
    assert!(one < star && star < three);

    let wrapped = Expression::new("cnt(1,2)").diagram(4);
    assert!(wrapped.lines().all(|line| line.starts_with("    ")));
}
