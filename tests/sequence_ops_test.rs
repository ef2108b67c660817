//! Sequence statistics and transforms through the expression language.

use expr_engine::{assert_approx_eq, interp, Value};

fn real(text: &str) -> f64 {
    match interp(text, None) {
        Value::Real(v) => v,
        other => panic!("{:?} evaluated to {:?}, expected a real", text, other),
    }
}

fn sequence(text: &str) -> Vec<Value> {
    match interp(text, None) {
        Value::Sequence(items) => items,
        other => panic!("{:?} evaluated to {:?}, expected a sequence", text, other),
    }
}

#[test]
fn test_counting_and_basic_statistics() {
    assert_eq!(real("cnt(1,2,3)"), 3.0);
    assert_eq!(real("cnt((1,2,3))"), 3.0);
    assert_eq!(real("mean(1,2,3,4)"), 2.5);
    assert_eq!(real("min(5,2,8)"), 2.0);
    assert_eq!(real("max(5,2,8)"), 8.0);
    assert_eq!(real("range(5,2,8)"), 6.0);
    assert_eq!(real("med(3,1,2)"), 2.0);
    assert_eq!(real("med(4,1,2,3)"), 2.5);
    assert_eq!(real("mode(1,2,2,3)"), 2.0);
}

#[test]
fn test_spread_statistics() {
    assert_eq!(real("var(2,4,4,4,5,5,7,9)"), 4.0);
    assert_eq!(real("dev(2,4,4,4,5,5,7,9)"), 2.0);
    assert_approx_eq!(real("gmean(2,8)"), 4.0, 1e-9);
    assert_approx_eq!(real("qmean(3,4)"), (12.5f64).sqrt(), 1e-9);
    assert_approx_eq!(real("hmean(2,6,3)"), 3.0, 1e-9);
    assert_approx_eq!(real("hypot(3,4)"), 5.0, 1e-9);
}

#[test]
fn test_uniq_preserves_first_occurrence() {
    assert_eq!(
        sequence("uniq(3,1,3,2,1)"),
        vec![Value::Real(3.0), Value::Real(1.0), Value::Real(2.0)]
    );
    assert_eq!(real("cnt(uniq((1,1,2,3,3)))"), 3.0);
}

#[test]
fn test_norm_and_znorm_sequences() {
    assert_eq!(
        sequence("norm(0,5,10)"),
        vec![Value::Real(0.0), Value::Real(0.5), Value::Real(1.0)]
    );
    assert_eq!(
        sequence("znorm(4,4)"),
        vec![Value::Real(0.0), Value::Real(0.0)]
    );
}

#[test]
fn test_gcd_lcm() {
    assert_eq!(real("gcd(12,18,30)"), 6.0);
    assert_eq!(real("gcd(7,13)"), 1.0);
    assert_eq!(real("lcm(4,6)"), 12.0);
    assert_eq!(real("lcm(4,0,6)"), 0.0);
}

#[test]
fn test_transforms_round_trip() {
    // dft then idft restores the samples at the exact length.
    let restored = sequence("idft(dft((1,2,3)))");
    let expected = [1.0, 2.0, 3.0];
    for (value, want) in restored.iter().zip(expected) {
        let c = value.to_complex();
        assert_approx_eq!(c.re, want, 1e-9);
        assert_approx_eq!(c.im, 0.0, 1e-9);
    }

    // fft pads to the next power of two; ifft undoes it on the padded length.
    let restored = sequence("ifft(fft((1,2,3,4,5)))");
    assert_eq!(restored.len(), 8);
    let expected = [1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0];
    for (value, want) in restored.iter().zip(expected) {
        let c = value.to_complex();
        assert_approx_eq!(c.re, want, 1e-9);
        assert_approx_eq!(c.im, 0.0, 1e-9);
    }
}

#[test]
fn test_z_transform() {
    // zt((1,2,3), 2) = 1 + 1 + 0.75
    match interp("zt((1,2,3), 2)", None) {
        Value::Real(v) => assert_approx_eq!(v, 2.75, 1e-9),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_statistics_feed_arithmetic() {
    assert_eq!(real("total(1,2,3) * 2"), 12.0);
    assert_eq!(real("max(1,5,3) + min(1,5,3)"), 6.0);
    assert_eq!(real("cnt(sel((1,2,3,4), 2))"), 1.0);
}
